use serde::{Deserialize, Serialize};

/// Animation tuning shared by both paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Clip fade-in/fade-out duration (seconds).
    pub crossfade: f32,
    /// Moving playback rate is `speed * rate_scale`, clamped to the bounds below.
    pub rate_scale: f32,
    pub min_rate: f32,
    pub max_rate: f32,

    /// Walk phase advance per second per unit of speed.
    pub phase_rate: f32,
    pub bob_amplitude: f32,
    pub sway_amplitude: f32,
    pub lean_amplitude: f32,
    pub arm_amplitude: f32,
    pub leg_amplitude: f32,
    pub breath_amplitude: f32,
    /// Breathing angular frequency (radians per second).
    pub breath_rate: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            crossfade: 0.3,
            rate_scale: 0.5,
            min_rate: 0.8,
            max_rate: 2.0,
            phase_rate: 15.0,
            bob_amplitude: 0.1,
            sway_amplitude: 0.05,
            lean_amplitude: 0.08,
            arm_amplitude: 0.5,
            leg_amplitude: 0.4,
            breath_amplitude: 0.02,
            breath_rate: 2.0,
        }
    }
}

impl AnimationConfig {
    /// Clip playback rate for the moving state.
    pub fn moving_rate(&self, speed: f32) -> f32 {
        (speed * self.rate_scale).clamp(self.min_rate, self.max_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_rate_is_clamped() {
        let c = AnimationConfig::default();
        assert_eq!(c.moving_rate(0.0), 0.8);
        assert_eq!(c.moving_rate(3.0), 1.5);
        assert_eq!(c.moving_rate(100.0), 2.0);
    }
}

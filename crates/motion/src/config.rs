use serde::{Deserialize, Serialize};

/// How smoothing factors relate to frame time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Factors apply once per tick regardless of `dt`; velocity is a per-tick
    /// displacement. Tuned for a ~60 Hz frame callback.
    #[default]
    PerFrame,
    /// Factors and displacement are scaled by `dt / reference_dt`, so motion
    /// is the same at any frame rate.
    FrameRateIndependent,
}

/// Motion tuning. Speeds are world units per reference frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Walking speed.
    pub base_speed: f32,
    /// Speed while the run modifier is held. Hard ceiling on velocity magnitude.
    pub run_speed: f32,
    /// Share of the velocity-to-target gap kept each frame while input is held.
    pub acceleration: f32,
    /// Share of velocity kept each frame once input is released.
    pub deceleration: f32,
    /// Multiplier turning raw velocity into the HUD speed readout.
    pub display_scale: f32,
    /// Raw velocity magnitude above which the avatar counts as moving.
    pub moving_epsilon: f32,
    pub smoothing: SmoothingMode,
    /// Frame duration the per-frame factors were tuned for (seconds).
    pub reference_dt: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.05,
            run_speed: 0.1,
            acceleration: 0.8,
            deceleration: 0.9,
            display_scale: 50.0,
            moving_epsilon: 0.01,
            smoothing: SmoothingMode::PerFrame,
            reference_dt: 1.0 / 60.0,
        }
    }
}

impl MotionConfig {
    /// Number of reference frames a tick of `dt` stands for.
    pub fn frames_for(&self, dt: f32) -> f32 {
        match self.smoothing {
            SmoothingMode::PerFrame => 1.0,
            SmoothingMode::FrameRateIndependent => {
                if self.reference_dt > 0.0 {
                    (dt / self.reference_dt).max(0.0)
                } else {
                    1.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_is_faster_than_walk() {
        let c = MotionConfig::default();
        assert!(c.run_speed > c.base_speed);
    }

    #[test]
    fn per_frame_ignores_dt() {
        let c = MotionConfig::default();
        assert_eq!(c.frames_for(0.5), 1.0);
    }

    #[test]
    fn frame_rate_independent_scales_with_dt() {
        let c = MotionConfig {
            smoothing: SmoothingMode::FrameRateIndependent,
            ..MotionConfig::default()
        };
        assert!((c.frames_for(1.0 / 30.0) - 2.0).abs() < 1e-4);
        assert_eq!(c.frames_for(-1.0), 0.0);
    }
}

use questwalk_assets::{AnimationClip, ClipRoles};
use serde::{Deserialize, Serialize};

use crate::config::AnimationConfig;

/// What the rigged path is currently playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSelection {
    pub active_clip: Option<String>,
    /// Current weight of the active clip (ramps 0 to 1 over a crossfade).
    pub blend_weight: f32,
    pub playback_rate: f32,
}

/// Playback state of one clip.
#[derive(Debug, Clone, Default)]
struct ClipAction {
    time: f32,
    weight: f32,
    fade_target: f32,
    /// Weight change per second toward `fade_target`.
    fade_speed: f32,
    rate: f32,
    playing: bool,
}

impl ClipAction {
    fn fade_to(&mut self, target: f32, duration: f32) {
        self.fade_target = target;
        if duration > 0.0 {
            self.fade_speed = 1.0 / duration;
        } else {
            self.weight = target;
            self.fade_speed = 0.0;
        }
    }

    fn update(&mut self, dt: f32, duration: f32) {
        if !self.playing {
            return;
        }
        if duration > 0.0 {
            self.time = (self.time + dt * self.rate).rem_euclid(duration);
        }
        let step = self.fade_speed * dt;
        if self.weight < self.fade_target {
            self.weight = (self.weight + step).min(self.fade_target);
        } else if self.weight > self.fade_target {
            self.weight = (self.weight - step).max(self.fade_target);
        }
        if self.weight <= 0.0 && self.fade_target <= 0.0 {
            self.playing = false;
        }
    }
}

/// Crossfades between a rigged avatar's idle and moving clips.
#[derive(Debug, Clone)]
pub struct AnimationController {
    config: AnimationConfig,
    clips: Vec<AnimationClip>,
    roles: ClipRoles,
    actions: Vec<ClipAction>,
    active: Option<usize>,
}

impl AnimationController {
    pub fn new(clips: Vec<AnimationClip>, roles: ClipRoles, config: AnimationConfig) -> Self {
        let actions = vec![ClipAction::default(); clips.len()];
        Self {
            config,
            clips,
            roles,
            actions,
            active: None,
        }
    }

    /// Pick the clip for the motion state and start a crossfade if it changed.
    ///
    /// Selecting the clip that is already active does nothing.
    pub fn select_state(&mut self, is_moving: bool, speed: f32) -> AnimationSelection {
        let desired = if is_moving {
            self.roles.moving
        } else {
            self.roles.idle
        };

        if self.active != Some(desired) && desired < self.actions.len() {
            let fade = self.config.crossfade;
            if let Some(prev) = self.active {
                self.actions[prev].fade_to(0.0, fade);
            }

            let rate = if is_moving {
                self.config.moving_rate(speed)
            } else {
                1.0
            };
            let action = &mut self.actions[desired];
            *action = ClipAction {
                rate,
                playing: true,
                ..ClipAction::default()
            };
            action.fade_to(1.0, fade);
            self.active = Some(desired);

            tracing::debug!(clip = %self.clips[desired].name, rate, "crossfading clip");
        }

        self.selection()
    }

    /// Advance clip times and fade weights.
    pub fn update(&mut self, dt: f32) {
        for (action, clip) in self.actions.iter_mut().zip(&self.clips) {
            action.update(dt, clip.duration);
        }
    }

    pub fn selection(&self) -> AnimationSelection {
        match self.active {
            Some(i) => AnimationSelection {
                active_clip: Some(self.clips[i].name.clone()),
                blend_weight: self.actions[i].weight,
                playback_rate: self.actions[i].rate,
            },
            None => AnimationSelection {
                active_clip: None,
                blend_weight: 0.0,
                playback_rate: 1.0,
            },
        }
    }

    /// Weight of every clip that is still playing.
    pub fn playing_weights(&self) -> Vec<(&str, f32)> {
        self.clips
            .iter()
            .zip(&self.actions)
            .filter(|(_, a)| a.playing)
            .map(|(c, a)| (c.name.as_str(), a.weight))
            .collect()
    }

    /// Playback time of the active clip.
    pub fn active_time(&self) -> Option<f32> {
        self.active.map(|i| self.actions[i].time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(name: &str, duration: f32) -> AnimationClip {
        AnimationClip {
            name: name.into(),
            duration,
        }
    }

    fn controller() -> AnimationController {
        let clips = vec![clip("Idle", 2.0), clip("Walk", 1.0)];
        let roles = ClipRoles::resolve(&clips).unwrap();
        AnimationController::new(clips, roles, AnimationConfig::default())
    }

    #[test]
    fn idle_selects_idle_clip_at_unit_rate() {
        let mut c = controller();
        let s = c.select_state(false, 0.0);
        assert_eq!(s.active_clip.as_deref(), Some("Idle"));
        assert_eq!(s.playback_rate, 1.0);
        assert_eq!(s.blend_weight, 0.0);
    }

    #[test]
    fn moving_rate_tracks_speed() {
        let mut c = controller();
        let s = c.select_state(true, 3.0);
        assert_eq!(s.active_clip.as_deref(), Some("Walk"));
        assert!((s.playback_rate - 1.5).abs() < 1e-6);

        let mut c = controller();
        assert_eq!(c.select_state(true, 0.5).playback_rate, 0.8);
    }

    #[test]
    fn crossfade_completes_after_fade_duration() {
        let mut c = controller();
        c.select_state(false, 0.0);
        for _ in 0..30 {
            c.update(1.0 / 60.0);
        }
        c.select_state(true, 2.5);
        c.update(0.15);
        let weights = c.playing_weights();
        assert_eq!(weights.len(), 2);
        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-4);

        c.update(0.2);
        assert_eq!(c.playing_weights(), vec![("Walk", 1.0)]);
        assert_eq!(c.selection().blend_weight, 1.0);
    }

    #[test]
    fn reselecting_same_state_is_idempotent() {
        let mut c = controller();
        c.select_state(true, 2.0);
        c.update(0.1);
        let before = c.selection();
        let time_before = c.active_time();
        let after = c.select_state(true, 4.0);
        assert_eq!(before, after);
        assert_eq!(c.active_time(), time_before);
    }

    #[test]
    fn single_clip_never_transitions() {
        let clips = vec![clip("Take 001", 1.0)];
        let roles = ClipRoles::resolve(&clips).unwrap();
        let mut c = AnimationController::new(clips, roles, AnimationConfig::default());
        c.select_state(false, 0.0);
        c.update(0.5);
        let s = c.select_state(true, 3.0);
        assert_eq!(s.active_clip.as_deref(), Some("Take 001"));
        assert_eq!(s.playback_rate, 1.0);
        assert_eq!(s.blend_weight, 1.0);
    }

    #[test]
    fn clip_time_loops() {
        let mut c = controller();
        c.select_state(true, 2.0); // rate 1.0
        for _ in 0..5 {
            c.update(0.3);
        }
        let t = c.active_time().unwrap();
        assert!((t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn nothing_selected_initially() {
        let c = controller();
        assert_eq!(c.selection().active_clip, None);
        assert!(c.playing_weights().is_empty());
    }
}

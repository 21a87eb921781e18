use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::FRAC_1_SQRT_2;

use crate::key::LogicalKey;

/// Snapshot of which logical keys are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

impl InputState {
    /// Build a state with the given keys held.
    pub fn with_keys(keys: &[LogicalKey]) -> Self {
        let mut state = Self::default();
        for &key in keys {
            state.set(key, true);
        }
        state
    }

    pub fn set(&mut self, key: LogicalKey, held: bool) {
        match key {
            LogicalKey::Forward => self.forward = held,
            LogicalKey::Backward => self.backward = held,
            LogicalKey::Left => self.left = held,
            LogicalKey::Right => self.right = held,
            LogicalKey::Run => self.run = held,
        }
    }

    pub fn is_held(&self, key: LogicalKey) -> bool {
        match key {
            LogicalKey::Forward => self.forward,
            LogicalKey::Backward => self.backward,
            LogicalKey::Left => self.left,
            LogicalKey::Right => self.right,
            LogicalKey::Run => self.run,
        }
    }

    /// Movement direction on the ground plane: `x` is +right, `y` is +backward,
    /// so forward maps to −Z once lifted into 3D.
    ///
    /// Opposite keys cancel. Two orthogonal keys yield components of
    /// `1/√2` so diagonal travel is never faster than cardinal travel.
    pub fn direction(&self) -> Vec2 {
        let x = axis(self.right, self.left);
        let y = axis(self.backward, self.forward);
        if x != 0.0 && y != 0.0 {
            Vec2::new(x * FRAC_1_SQRT_2, y * FRAC_1_SQRT_2)
        } else {
            Vec2::new(x, y)
        }
    }

    pub fn has_direction(&self) -> bool {
        self.direction() != Vec2::ZERO
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Tracks held movement keys between frames.
///
/// The sampler is owned by the scene and has an explicit lifecycle: key events
/// are only honored between [`attach`](Self::attach) and
/// [`detach`](Self::detach).
///
/// Several host keys can map to one logical key (`W` and `ArrowUp`, both
/// Shifts). A logical key stays held until every host key mapped to it is up.
#[derive(Debug, Default)]
pub struct InputSampler {
    state: InputState,
    /// Host key names currently down, per logical key.
    held: BTreeMap<LogicalKey, BTreeSet<String>>,
    attached: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start honoring key events.
    pub fn attach(&mut self) {
        if !self.attached {
            tracing::debug!("input sampler attached");
        }
        self.attached = true;
    }

    /// Stop honoring key events and release every held key.
    pub fn detach(&mut self) {
        if self.attached {
            tracing::debug!("input sampler detached");
        }
        self.attached = false;
        self.state = InputState::default();
        self.held.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Handle a host key-down. Unrecognized keys are ignored.
    pub fn on_key_down(&mut self, key_name: &str) {
        self.apply(key_name, true);
    }

    /// Handle a host key-up. Unrecognized keys are ignored.
    pub fn on_key_up(&mut self, key_name: &str) {
        self.apply(key_name, false);
    }

    /// Set a logical key directly (scripted input, replays).
    pub fn set_key(&mut self, key: LogicalKey, held: bool) {
        if self.attached {
            if !held {
                self.held.remove(&key);
            }
            self.state.set(key, held);
        }
    }

    /// Replace the whole held-key state (used when replaying recordings).
    pub fn set_state(&mut self, state: InputState) {
        if self.attached {
            self.state = state;
            self.held.clear();
        }
    }

    pub fn current_direction(&self) -> Vec2 {
        self.state.direction()
    }

    pub fn is_run_modifier_held(&self) -> bool {
        self.state.run
    }

    pub fn snapshot(&self) -> InputState {
        self.state
    }

    fn apply(&mut self, key_name: &str, held: bool) {
        if !self.attached {
            return;
        }
        let Some(key) = LogicalKey::from_key_name(key_name) else {
            tracing::trace!(key = key_name, "ignoring unmapped key");
            return;
        };
        let names = self.held.entry(key).or_default();
        if held {
            names.insert(host_key(key_name));
        } else {
            names.remove(&host_key(key_name));
        }
        let still_held = !names.is_empty();
        self.state.set(key, still_held);
    }
}

/// Physical key identity: lowercase, with the `Key` prefix of code-style
/// names dropped so `KeyW` and `w` are the same key.
fn host_key(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    match lower.strip_prefix("key") {
        Some(rest) if rest.len() == 1 => rest.to_string(),
        _ => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> InputSampler {
        let mut s = InputSampler::new();
        s.attach();
        s
    }

    #[test]
    fn no_keys_no_direction() {
        let s = attached();
        assert_eq!(s.current_direction(), Vec2::ZERO);
        assert!(!s.is_run_modifier_held());
    }

    #[test]
    fn forward_is_negative_y() {
        let mut s = attached();
        s.on_key_down("w");
        assert_eq!(s.current_direction(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn diagonal_is_unit_length() {
        let mut s = attached();
        s.on_key_down("W");
        s.on_key_down("d");
        let d = s.current_direction();
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!((d.x - FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((d.y + FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn every_key_combination_is_unit_or_zero() {
        for bits in 0u8..16 {
            let state = InputState {
                forward: bits & 1 != 0,
                backward: bits & 2 != 0,
                left: bits & 4 != 0,
                right: bits & 8 != 0,
                run: false,
            };
            let len = state.direction().length();
            assert!(
                len == 0.0 || (len - 1.0).abs() < 1e-6,
                "bits {bits:04b} gave length {len}"
            );
        }
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut s = attached();
        s.on_key_down("a");
        s.on_key_down("d");
        assert_eq!(s.current_direction(), Vec2::ZERO);
    }

    #[test]
    fn key_up_releases() {
        let mut s = attached();
        s.on_key_down("w");
        s.on_key_down("shift");
        assert!(s.is_run_modifier_held());
        s.on_key_up("W");
        s.on_key_up("Shift");
        assert_eq!(s.current_direction(), Vec2::ZERO);
        assert!(!s.is_run_modifier_held());
    }

    #[test]
    fn alias_release_keeps_logical_key_held() {
        let mut s = attached();
        s.on_key_down("w");
        s.on_key_down("ArrowUp");
        s.on_key_up("ArrowUp");
        assert_eq!(s.current_direction(), Vec2::new(0.0, -1.0));
        s.on_key_up("w");
        assert_eq!(s.current_direction(), Vec2::ZERO);
    }

    #[test]
    fn both_shifts_must_be_released() {
        let mut s = attached();
        s.on_key_down("ShiftLeft");
        s.on_key_down("ShiftRight");
        s.on_key_up("ShiftLeft");
        assert!(s.is_run_modifier_held());
        s.on_key_up("ShiftRight");
        assert!(!s.is_run_modifier_held());
    }

    #[test]
    fn code_and_letter_names_are_one_key() {
        let mut s = attached();
        s.on_key_down("KeyW");
        s.on_key_up("w");
        assert_eq!(s.current_direction(), Vec2::ZERO);
    }

    #[test]
    fn repeated_key_down_needs_one_key_up() {
        let mut s = attached();
        s.on_key_down("d");
        s.on_key_down("d");
        s.on_key_up("d");
        assert_eq!(s.current_direction(), Vec2::ZERO);
    }

    #[test]
    fn unknown_keys_change_nothing() {
        let mut s = attached();
        s.on_key_down("q");
        s.on_key_down("Enter");
        assert_eq!(s.snapshot(), InputState::default());
    }

    #[test]
    fn detached_sampler_ignores_events() {
        let mut s = InputSampler::new();
        s.on_key_down("w");
        assert_eq!(s.current_direction(), Vec2::ZERO);
    }

    #[test]
    fn detach_releases_held_keys() {
        let mut s = attached();
        s.on_key_down("w");
        s.detach();
        assert!(!s.is_attached());
        assert_eq!(s.snapshot(), InputState::default());
        s.on_key_down("w");
        assert_eq!(s.snapshot(), InputState::default());
    }
}

//! Motion integration: held-key direction in, smoothed avatar motion out.
//!
//! # Invariants
//! - Velocity magnitude never exceeds the configured run speed.
//! - Velocity is only ever approached by exponential smoothing, never set from input.
//! - `is_moving` flips to false exactly once while decelerating with no input.
//! - Integration is pure with respect to (dt, direction, run) history.

pub mod config;
pub mod integrator;

pub use config::{MotionConfig, SmoothingMode};
pub use integrator::{MotionIntegrator, MotionState};

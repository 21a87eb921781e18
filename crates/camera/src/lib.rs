//! Follow camera for the avatar.
//!
//! # Invariants
//! - The camera only teleports through `snap_to`, used at scene start.
//! - Each tick closes a fraction `1 - exp(-damping * dt)` of the gap to the target.

mod rig;

pub use rig::{CameraConfig, CameraRig, CameraState};

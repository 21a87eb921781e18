//! Scene orchestration: the per-frame update loop around the avatar.
//!
//! Each frame: poll avatar resolution, sample input, integrate motion,
//! advance the avatar's animation path, chase with the camera, report the
//! new position to the host.
//!
//! # Invariants
//! - Key and scroll events only mutate state; only `frame` steps the simulation.
//! - Motion integrates whether or not the avatar has resolved.
//! - The animation path is fixed once the avatar resolves.
//! - After `teardown` no frame runs and no callback fires.

mod config;
mod hud;
mod orchestrator;
mod throttle;

pub use config::{ConfigError, SceneConfig};
pub use hud::{HudReadout, MovementStatus};
pub use orchestrator::{FrameReport, SceneOrchestrator, ScenePhase};
pub use throttle::{ScrollThrottle, ThrottleConfig};

pub fn crate_info() -> &'static str {
    "questwalk-scene v0.1.0"
}

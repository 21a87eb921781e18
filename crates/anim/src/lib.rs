//! Avatar animation paths.
//!
//! A resolved avatar gets exactly one [`AnimationPath`]: clip crossfading
//! when the model carries clips, procedural transforms otherwise. The path is
//! chosen once and both arms expose the same `advance` step.
//!
//! # Invariants
//! - The two paths never run on the same avatar instance.
//! - The rigged path never writes scene-graph transforms.
//! - Procedural offsets are applied relative to the captured rest pose.

pub mod config;
pub mod controller;
pub mod path;
pub mod procedural;

pub use config::AnimationConfig;
pub use controller::{AnimationController, AnimationSelection};
pub use path::{AnimationPath, PathKind};
pub use procedural::ProceduralAnimator;

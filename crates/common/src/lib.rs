//! Shared types for the avatar scene.
//!
//! # Invariants
//! - Scene graph nodes are addressed by index; ids never dangle once issued.
//! - Node 0 is always the avatar root.

pub mod rng;
pub mod scene;
pub mod types;

pub use rng::splitmix64;
pub use scene::{NodeId, SceneGraph, SceneGraphError, SceneNode};
pub use types::{AvatarId, Transform};

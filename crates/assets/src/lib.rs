//! Avatar assets: what the scene animates, and how it gets resolved.
//!
//! A model is loaded once through a [`ModelLoader`] and turned into an
//! [`AvatarAsset`]: `Rigged` when it declares animation clips, `Procedural`
//! otherwise. Load failures never surface to the scene; they resolve to the
//! blocky placeholder avatar instead.
//!
//! # Invariants
//! - An asset is immutable after resolution; scenes animate a cloned instance.
//! - Node and clip roles are computed once here, never per frame.
//! - A rigged asset always has at least one clip.

mod avatar;
mod import;
mod placeholder;
mod resolver;

pub use avatar::{AnimationClip, AssetId, AvatarAsset, ClipRoles, NodeRoles};
pub use import::GltfLoader;
pub use placeholder::{loading_marker, placeholder_avatar};
pub use resolver::{AvatarResolver, LoadedModel, ModelLoader};

use questwalk_common::SceneGraphError;

/// Errors from avatar loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported avatar URL: {0}")]
    UnsupportedUrl(String),
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("scene graph error: {0}")]
    Scene(#[from] SceneGraphError),
}

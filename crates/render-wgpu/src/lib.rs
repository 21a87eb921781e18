//! wgpu render backend for the avatar scene.
//!
//! Draws a fogged ground plane with the avatar's blob shadow and one
//! instanced cube per scene-graph node that carries a block size. The scene
//! is rendered into an offscreen target sized by the frame's render scale
//! and upscaled onto the surface, so degraded frames cost fewer pixels.
//! Block instances are built on the CPU from the avatar's world matrix, so
//! they can be inspected without a GPU.
//!
//! # Invariants
//! - The renderer never mutates the scene graph or motion state.
//! - Block instances follow scene-graph order (parents before children).
//! - The scene target is never smaller than 1x1 or larger than the surface.

mod blocks;
mod gpu;
mod shaders;

pub use blocks::{BlockInstance, BlockRole, avatar_blocks};
pub use gpu::{RenderFrame, SKY, WgpuRenderer, scaled_extent};

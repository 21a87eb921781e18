use glam::{Quat, Vec3};
use questwalk_common::{NodeId, SceneGraph, Transform};
use std::path::{Path, PathBuf};

use crate::AssetError;
use crate::avatar::{AnimationClip, AssetId};
use crate::resolver::{LoadedModel, ModelLoader};

const MESH_BLOCK: f32 = 0.25;
const JOINT_BLOCK: f32 = 0.08;

/// Loads `.gltf` and `.glb` models from local paths or `file://` URLs.
///
/// Only the node hierarchy (names, TRS, children) and animation clip names
/// and durations are read. Vertex data stays with the render engine.
#[derive(Debug, Clone, Default)]
pub struct GltfLoader {
    /// Directory relative paths are resolved against.
    base_dir: Option<PathBuf>,
}

impl GltfLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve_path(&self, url: &str) -> Result<PathBuf, AssetError> {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        if raw.contains("://") {
            return Err(AssetError::UnsupportedUrl(url.to_string()));
        }
        let path = Path::new(raw);
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ModelLoader for GltfLoader {
    fn load(&self, url: &str) -> Result<LoadedModel, AssetError> {
        let path = self.resolve_path(url)?;
        let data = std::fs::read(&path)?;
        let model = parse_gltf(&data, path.parent())?;
        tracing::debug!(
            path = %path.display(),
            nodes = model.scene.len(),
            clips = model.clips.len(),
            "imported glTF avatar"
        );
        Ok(model)
    }
}

fn gltf_err(e: ::gltf::Error) -> AssetError {
    AssetError::GltfParse(e.to_string())
}

/// Parse `.gltf` JSON or `.glb` bytes into a scene graph and clip table.
/// External buffers are looked up relative to `base`.
pub(crate) fn parse_gltf(data: &[u8], base: Option<&Path>) -> Result<LoadedModel, AssetError> {
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::from_slice(data).map_err(gltf_err)?;
    let buffers = ::gltf::import_buffers(&document, base, blob).map_err(gltf_err)?;

    let mut scene = SceneGraph::new("avatar_root");
    let mut visited = vec![false; document.nodes().count()];
    let mut stack: Vec<(::gltf::Node, NodeId)> = scene_roots(&document)
        .into_iter()
        .rev()
        .map(|n| (n, scene.root()))
        .collect();

    // Depth-first so parents are always inserted before their children.
    while let Some((node, parent)) = stack.pop() {
        let index = node.index();
        if std::mem::replace(&mut visited[index], true) {
            tracing::warn!(index, "glTF node reachable twice, skipping");
            continue;
        }
        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{index}"));
        let block_size = if node.mesh().is_some() {
            MESH_BLOCK
        } else {
            JOINT_BLOCK
        };
        let id = scene.add_child(
            parent,
            name,
            node_transform(&node),
            Some(Vec3::splat(block_size)),
        )?;
        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            stack.push((child, id));
        }
    }

    let clips = document
        .animations()
        .map(|anim| AnimationClip {
            name: anim
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{}", anim.index())),
            duration: clip_duration(&anim, &buffers),
        })
        .collect();

    Ok(LoadedModel {
        scene,
        clips,
        source: AssetId::from_bytes(data),
    })
}

/// The default scene's roots, or every node nobody lists as a child.
fn scene_roots(document: &::gltf::Document) -> Vec<::gltf::Node<'_>> {
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        return scene.nodes().collect();
    }
    let mut is_child = vec![false; document.nodes().count()];
    for node in document.nodes() {
        for child in node.children() {
            is_child[child.index()] = true;
        }
    }
    document
        .nodes()
        .filter(|n| !is_child[n.index()])
        .collect()
}

fn node_transform(node: &::gltf::Node) -> Transform {
    let (translation, rotation, scale) = node.transform().decomposed();
    Transform {
        position: Vec3::from(translation),
        rotation: Quat::from_array(rotation).normalize(),
        scale: Vec3::from(scale),
    }
}

/// Last keyframe time across every channel, or 1 s when no channel has
/// any time past zero. Inputs without a buffer view fall back to the
/// accessor's declared `max`.
fn clip_duration(anim: &::gltf::Animation, buffers: &[::gltf::buffer::Data]) -> f32 {
    anim.channels()
        .filter_map(|ch| {
            let input = ch.sampler().input();
            if input.view().is_none() {
                let max = input.max()?;
                return Some(max.as_array()?.first()?.as_f64()? as f32);
            }
            let reader = ch.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            reader.read_inputs()?.last()
        })
        .fold(None, |acc: Option<f32>, t| Some(acc.map_or(t, |a| a.max(t))))
        .filter(|d| *d > 0.0)
        .unwrap_or(1.0)
}

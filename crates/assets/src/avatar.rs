use questwalk_common::{NodeId, SceneGraph};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolver::LoadedModel;

/// Content-addressed id of a loaded avatar source, computed from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        Self(u64::from_le_bytes(bytes))
    }
}

/// A named animation clip declared by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Clip length in seconds.
    pub duration: f32,
}

const ARM_NAMES: &[&str] = &["arm", "shoulder"];
const LEG_NAMES: &[&str] = &["leg", "thigh"];
const MOVING_CLIP_NAMES: &[&str] = &["walk", "walking", "run"];
const IDLE_CLIP_NAMES: &[&str] = &["idle", "standing"];

/// Limb proxies the procedural animator swings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRoles {
    pub arms: Vec<NodeId>,
    pub legs: Vec<NodeId>,
}

impl NodeRoles {
    /// Find limb nodes by name. A node is skipped when one of its ancestors
    /// already plays the same role, so nested bones ("LeftArm" under
    /// "LeftShoulder") do not compound their swing.
    pub fn resolve(scene: &SceneGraph) -> Self {
        Self {
            arms: outermost(scene, scene.find_containing(ARM_NAMES)),
            legs: outermost(scene, scene.find_containing(LEG_NAMES)),
        }
    }
}

fn outermost(scene: &SceneGraph, ids: Vec<NodeId>) -> Vec<NodeId> {
    ids.iter()
        .copied()
        .filter(|&id| {
            let mut cursor = scene.get(id).and_then(|n| n.parent);
            while let Some(p) = cursor {
                if ids.contains(&p) {
                    return false;
                }
                cursor = scene.get(p).and_then(|n| n.parent);
            }
            true
        })
        .collect()
}

/// Which clip plays for each motion state, as indices into the clip table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRoles {
    pub moving: usize,
    pub idle: usize,
}

impl ClipRoles {
    /// Match clips by case-insensitive substring. Unmatched roles fall back
    /// to the first declared clip. `None` when there are no clips.
    pub fn resolve(clips: &[AnimationClip]) -> Option<Self> {
        if clips.is_empty() {
            return None;
        }
        Some(Self {
            moving: find_clip(clips, MOVING_CLIP_NAMES).unwrap_or(0),
            idle: find_clip(clips, IDLE_CLIP_NAMES).unwrap_or(0),
        })
    }
}

fn find_clip(clips: &[AnimationClip], needles: &[&str]) -> Option<usize> {
    needles.iter().find_map(|needle| {
        clips
            .iter()
            .position(|c| c.name.to_lowercase().contains(needle))
    })
}

/// A resolved avatar. Exactly one animation path applies to each variant.
#[derive(Debug, Clone)]
pub enum AvatarAsset {
    /// Model with authored clips, driven by clip crossfades.
    Rigged {
        scene: SceneGraph,
        clips: Vec<AnimationClip>,
        clip_roles: ClipRoles,
        node_roles: NodeRoles,
        source: AssetId,
    },
    /// Geometry without clips, driven by procedural transforms.
    Procedural {
        scene: SceneGraph,
        node_roles: NodeRoles,
        source: Option<AssetId>,
    },
}

impl AvatarAsset {
    /// Classify a loaded model by whether it carries clips.
    pub fn from_model(model: LoadedModel) -> Self {
        let node_roles = NodeRoles::resolve(&model.scene);
        match ClipRoles::resolve(&model.clips) {
            Some(clip_roles) => Self::Rigged {
                scene: model.scene,
                clips: model.clips,
                clip_roles,
                node_roles,
                source: model.source,
            },
            None => Self::Procedural {
                scene: model.scene,
                node_roles,
                source: Some(model.source),
            },
        }
    }

    /// Wrap procedural geometry that did not come from a loaded file.
    pub fn procedural(scene: SceneGraph) -> Self {
        let node_roles = NodeRoles::resolve(&scene);
        Self::Procedural {
            scene,
            node_roles,
            source: None,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        match self {
            Self::Rigged { scene, .. } | Self::Procedural { scene, .. } => scene,
        }
    }

    pub fn node_roles(&self) -> &NodeRoles {
        match self {
            Self::Rigged { node_roles, .. } | Self::Procedural { node_roles, .. } => node_roles,
        }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        match self {
            Self::Rigged { clips, .. } => clips,
            Self::Procedural { .. } => &[],
        }
    }

    pub fn source(&self) -> Option<AssetId> {
        match self {
            Self::Rigged { source, .. } => Some(*source),
            Self::Procedural { source, .. } => *source,
        }
    }

    pub fn is_rigged(&self) -> bool {
        matches!(self, Self::Rigged { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Rigged { .. } => "rigged",
            Self::Procedural { .. } => "procedural",
        }
    }
}

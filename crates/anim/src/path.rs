use questwalk_assets::{AvatarAsset, NodeRoles};
use questwalk_common::SceneGraph;
use questwalk_motion::MotionState;
use serde::{Deserialize, Serialize};

use crate::config::AnimationConfig;
use crate::controller::{AnimationController, AnimationSelection};
use crate::procedural::ProceduralAnimator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Rigged,
    Procedural,
}

/// The single animation strategy bound to a resolved avatar.
#[derive(Debug, Clone)]
pub enum AnimationPath {
    Rigged(AnimationController),
    Procedural(ProceduralAnimator),
}

impl AnimationPath {
    /// Choose the path for an asset. `scene` is the live instance the
    /// procedural path will animate.
    pub fn for_asset(asset: &AvatarAsset, scene: &SceneGraph, config: &AnimationConfig) -> Self {
        match asset {
            AvatarAsset::Rigged {
                clips, clip_roles, ..
            } => Self::Rigged(AnimationController::new(
                clips.clone(),
                *clip_roles,
                config.clone(),
            )),
            AvatarAsset::Procedural { .. } => {
                Self::Procedural(ProceduralAnimator::new(scene, config.clone()))
            }
        }
    }

    pub fn kind(&self) -> PathKind {
        match self {
            Self::Rigged(_) => PathKind::Rigged,
            Self::Procedural(_) => PathKind::Procedural,
        }
    }

    /// Current clip selection without advancing anything.
    pub fn selection(&self) -> Option<AnimationSelection> {
        match self {
            Self::Rigged(controller) => Some(controller.selection()),
            Self::Procedural(_) => None,
        }
    }

    /// Advance animation by one frame. Returns the clip selection on the
    /// rigged path, `None` on the procedural one.
    pub fn advance(
        &mut self,
        scene: &mut SceneGraph,
        roles: &NodeRoles,
        motion: &MotionState,
        dt: f32,
        elapsed: f32,
    ) -> Option<AnimationSelection> {
        match self {
            Self::Rigged(controller) => {
                controller.select_state(motion.is_moving, motion.speed);
                controller.update(dt);
                Some(controller.selection())
            }
            Self::Procedural(animator) => {
                animator.apply(scene, roles, motion.is_moving, dt, motion.speed, elapsed);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use questwalk_assets::{AnimationClip, AssetId, LoadedModel, placeholder_avatar};
    use questwalk_common::Transform;

    fn rigged_asset() -> AvatarAsset {
        let placeholder = placeholder_avatar();
        AvatarAsset::from_model(LoadedModel {
            scene: placeholder.scene().clone(),
            clips: vec![
                AnimationClip {
                    name: "idle".into(),
                    duration: 1.0,
                },
                AnimationClip {
                    name: "walk".into(),
                    duration: 1.0,
                },
            ],
            source: AssetId(3),
        })
    }

    fn moving() -> MotionState {
        MotionState {
            velocity: Vec3::new(0.0, 0.0, -0.05),
            is_moving: true,
            speed: 2.5,
            ..MotionState::default()
        }
    }

    #[test]
    fn rigged_asset_gets_rigged_path() {
        let asset = rigged_asset();
        let scene = asset.scene().clone();
        let path = AnimationPath::for_asset(&asset, &scene, &AnimationConfig::default());
        assert_eq!(path.kind(), PathKind::Rigged);
    }

    #[test]
    fn rigged_path_leaves_transforms_alone() {
        let asset = rigged_asset();
        let mut scene = asset.scene().clone();
        let before: Vec<Transform> = scene.iter().map(|(_, n)| n.transform).collect();
        let mut path = AnimationPath::for_asset(&asset, &scene, &AnimationConfig::default());
        for _ in 0..60 {
            let sel = path.advance(&mut scene, asset.node_roles(), &moving(), 1.0 / 60.0, 0.0);
            assert_eq!(sel.unwrap().active_clip.as_deref(), Some("walk"));
        }
        let after: Vec<Transform> = scene.iter().map(|(_, n)| n.transform).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn procedural_path_mutates_transforms_without_selection() {
        let asset = placeholder_avatar();
        let mut scene = asset.scene().clone();
        let mut path = AnimationPath::for_asset(&asset, &scene, &AnimationConfig::default());
        assert_eq!(path.kind(), PathKind::Procedural);
        let sel = path.advance(&mut scene, asset.node_roles(), &moving(), 1.0 / 60.0, 0.0);
        assert!(sel.is_none());
        let root = scene.get(scene.root()).unwrap();
        assert!(root.transform.position.y > 0.0);
    }
}

use glam::Vec3;
use questwalk_common::{SceneGraph, Transform};

use crate::avatar::AvatarAsset;

/// Blocky humanoid used when no model is configured or loading fails.
///
/// Limbs hang from pivot nodes (`left_arm`, `right_leg`, ...) placed at the
/// shoulder and hip so rotating the pivot swings the whole block.
pub fn placeholder_avatar() -> AvatarAsset {
    AvatarAsset::procedural(blocky_humanoid())
}

/// Single block shown while the avatar model is still loading.
pub fn loading_marker() -> SceneGraph {
    let mut g = SceneGraph::new("loading_root");
    let root = g.root();
    // Root exists by construction.
    let _ = g.add_child(
        root,
        "loading_block",
        Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
        Some(Vec3::splat(0.5)),
    );
    g
}

fn blocky_humanoid() -> SceneGraph {
    let mut g = SceneGraph::new("avatar_root");
    if let Err(e) = build_humanoid(&mut g) {
        tracing::error!("placeholder avatar construction failed: {e}");
    }
    g
}

fn build_humanoid(g: &mut SceneGraph) -> Result<(), questwalk_common::SceneGraphError> {
    let root = g.root();
    let at = |x, y, z| Transform::from_position(Vec3::new(x, y, z));

    let body = g.add_child(root, "body", at(0.0, 1.1, 0.0), Some(Vec3::new(0.6, 0.8, 0.3)))?;
    g.add_child(body, "head", at(0.0, 0.65, 0.0), Some(Vec3::splat(0.4)))?;

    for (side, x) in [("left", -0.42), ("right", 0.42)] {
        let arm = g.add_child(body, format!("{side}_arm"), at(x, 0.35, 0.0), None)?;
        g.add_child(
            arm,
            format!("{side}_arm_block"),
            at(0.0, -0.35, 0.0),
            Some(Vec3::new(0.2, 0.7, 0.2)),
        )?;
    }

    for (side, x) in [("left", -0.15), ("right", 0.15)] {
        let leg = g.add_child(root, format!("{side}_leg"), at(x, 0.7, 0.0), None)?;
        g.add_child(
            leg,
            format!("{side}_leg_block"),
            at(0.0, -0.35, 0.0),
            Some(Vec3::new(0.25, 0.7, 0.25)),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_procedural_with_limbs() {
        let asset = placeholder_avatar();
        assert!(!asset.is_rigged());
        assert_eq!(asset.node_roles().arms.len(), 2);
        assert_eq!(asset.node_roles().legs.len(), 2);
        assert!(asset.source().is_none());
    }

    #[test]
    fn placeholder_limb_roles_are_pivots() {
        let asset = placeholder_avatar();
        for id in &asset.node_roles().arms {
            let node = asset.scene().get(*id).unwrap();
            assert!(node.block.is_none());
            assert_eq!(node.children.len(), 1);
        }
    }

    #[test]
    fn loading_marker_has_one_block() {
        let g = loading_marker();
        assert_eq!(g.iter().filter(|(_, n)| n.block.is_some()).count(), 1);
    }
}

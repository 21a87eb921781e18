use glam::{Mat4, Vec3};
use questwalk_common::SceneGraph;

/// What a block depicts, picked from its node name. The shader keys off the
/// role: loading blocks pulse, the rest are lit normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BlockRole {
    Body = 0,
    Head = 1,
    Arm = 2,
    Leg = 3,
    Loading = 4,
}

impl BlockRole {
    pub fn from_node_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("loading") {
            Self::Loading
        } else if name.contains("head") {
            Self::Head
        } else if name.contains("arm") {
            Self::Arm
        } else if name.contains("leg") {
            Self::Leg
        } else {
            Self::Body
        }
    }

    /// Base albedo.
    pub fn color(self) -> [f32; 4] {
        match self {
            Self::Body => [0.15, 0.45, 0.85, 1.0],
            Self::Head => [0.95, 0.78, 0.62, 1.0],
            Self::Arm => [0.25, 0.55, 0.95, 1.0],
            Self::Leg => [0.2, 0.25, 0.4, 1.0],
            Self::Loading => [0.6, 0.6, 0.6, 1.0],
        }
    }
}

/// One cube to draw: unit cube model matrix plus the node's role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockInstance {
    pub model: Mat4,
    pub role: BlockRole,
}

impl BlockInstance {
    pub fn color(&self) -> [f32; 4] {
        self.role.color()
    }
}

/// Build cube instances for every block-carrying node of `scene`, placed
/// under `avatar_world`.
pub fn avatar_blocks(scene: &SceneGraph, avatar_world: Mat4) -> Vec<BlockInstance> {
    let world = scene.world_matrices(avatar_world);
    scene
        .iter()
        .filter_map(|(id, node)| {
            let size = node.block?;
            let placed = world.get(id.0)?;
            Some(BlockInstance {
                model: *placed * Mat4::from_scale(size.max(Vec3::splat(1e-4))),
                role: BlockRole::from_node_name(&node.name),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use questwalk_assets::{loading_marker, placeholder_avatar};
    use questwalk_common::Transform;

    #[test]
    fn only_block_nodes_become_instances() {
        let mut g = SceneGraph::new("root");
        let root = g.root();
        let body = g
            .add_child(root, "body", Transform::from_position(Vec3::Y), Some(Vec3::ONE))
            .unwrap();
        g.add_child(body, "pivot", Transform::default(), None).unwrap();
        let blocks = avatar_blocks(&g, Mat4::IDENTITY);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].model.w_axis.truncate(), Vec3::Y);
        assert_eq!(blocks[0].role, BlockRole::Body);
    }

    #[test]
    fn avatar_world_moves_every_block() {
        let mut g = SceneGraph::new("root");
        let root = g.root();
        g.add_child(
            root,
            "left_arm_block",
            Transform::from_position(Vec3::new(0.5, 0.0, 0.0)),
            Some(Vec3::new(0.2, 0.6, 0.2)),
        )
        .unwrap();
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        let blocks = avatar_blocks(&g, world);
        assert_eq!(blocks[0].model.w_axis.truncate(), Vec3::new(0.5, 0.0, -3.0));
        assert_eq!(blocks[0].role, BlockRole::Arm);
        let scaled = blocks[0].model.transform_vector3(Vec3::Y);
        assert!((scaled.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn placeholder_limbs_get_limb_roles() {
        let asset = placeholder_avatar();
        let blocks = avatar_blocks(asset.scene(), Mat4::IDENTITY);
        let count = |role| blocks.iter().filter(|b| b.role == role).count();
        assert_eq!(count(BlockRole::Head), 1);
        assert_eq!(count(BlockRole::Arm), 2);
        assert_eq!(count(BlockRole::Leg), 2);
        assert_eq!(count(BlockRole::Loading), 0);
    }

    #[test]
    fn loading_marker_is_all_loading_blocks() {
        let blocks = avatar_blocks(&loading_marker(), Mat4::IDENTITY);
        assert!(!blocks.is_empty());
        assert!(blocks.iter().all(|b| b.role == BlockRole::Loading));
        assert_eq!(blocks[0].color(), [0.6, 0.6, 0.6, 1.0]);
    }
}

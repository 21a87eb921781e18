use glam::{Quat, Vec3};
use questwalk_assets::NodeRoles;
use questwalk_common::{NodeId, SceneGraph, Transform};
use std::f32::consts::PI;

use crate::config::AnimationConfig;

/// Common period of the bob, roll and pitch waves (`sin p`, `sin 0.8p`,
/// `sin 1.2p`); the phase wraps here so it keeps full precision.
const WALK_PERIOD: f32 = 10.0 * PI;

/// Synthesizes walk and idle motion for avatars without clips by writing
/// scene-graph transforms directly.
///
/// The root node bobs, rolls and leans; limb pivots swing about their local X
/// axis. Everything is an offset from the rest pose captured in [`new`](Self::new).
#[derive(Debug, Clone)]
pub struct ProceduralAnimator {
    config: AnimationConfig,
    walk_phase: f32,
    rest: Vec<Transform>,
}

impl ProceduralAnimator {
    pub fn new(scene: &SceneGraph, config: AnimationConfig) -> Self {
        Self {
            config,
            walk_phase: 0.0,
            rest: scene.iter().map(|(_, n)| n.transform).collect(),
        }
    }

    pub fn walk_phase(&self) -> f32 {
        self.walk_phase
    }

    /// Apply one frame of procedural animation.
    pub fn apply(
        &mut self,
        scene: &mut SceneGraph,
        roles: &NodeRoles,
        is_moving: bool,
        dt: f32,
        speed: f32,
        elapsed: f32,
    ) {
        let cfg = &self.config;
        let root = scene.root();

        if is_moving {
            self.walk_phase =
                (self.walk_phase + dt * cfg.phase_rate * speed).rem_euclid(WALK_PERIOD);
            let phase = self.walk_phase;

            let bob = phase.sin().abs() * cfg.bob_amplitude;
            let roll = (phase * 0.8).sin() * cfg.sway_amplitude;
            let pitch = (phase * 1.2).sin() * cfg.lean_amplitude;
            let arm = (phase + PI).sin() * cfg.arm_amplitude;
            let leg = phase.sin() * cfg.leg_amplitude;

            self.pose_root(scene, root, bob, pitch, roll);
            self.swing(scene, &roles.arms, arm);
            self.swing(scene, &roles.legs, leg);
        } else {
            let breath = (elapsed * cfg.breath_rate).sin() * cfg.breath_amplitude;
            self.pose_root(scene, root, breath, 0.0, 0.0);
            self.swing(scene, &roles.arms, 0.0);
            self.swing(scene, &roles.legs, 0.0);
        }
    }

    fn pose_root(&self, scene: &mut SceneGraph, root: NodeId, lift: f32, pitch: f32, roll: f32) {
        let Some(rest) = self.rest.get(root.0) else {
            return;
        };
        if let Some(node) = scene.get_mut(root) {
            node.transform.position = rest.position + Vec3::Y * lift;
            node.transform.rotation =
                rest.rotation * Quat::from_rotation_x(pitch) * Quat::from_rotation_z(roll);
        }
    }

    fn swing(&self, scene: &mut SceneGraph, nodes: &[NodeId], angle: f32) {
        for &id in nodes {
            let (Some(rest), Some(node)) = (self.rest.get(id.0), scene.get_mut(id)) else {
                continue;
            };
            node.transform.rotation = rest.rotation * Quat::from_rotation_x(angle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questwalk_assets::placeholder_avatar;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (SceneGraph, NodeRoles, ProceduralAnimator) {
        let asset = placeholder_avatar();
        let scene = asset.scene().clone();
        let roles = asset.node_roles().clone();
        let anim = ProceduralAnimator::new(&scene, AnimationConfig::default());
        (scene, roles, anim)
    }

    fn root_y(scene: &SceneGraph) -> f32 {
        scene.get(scene.root()).unwrap().transform.position.y
    }

    #[test]
    fn walking_advances_phase_and_swings_limbs() {
        let (mut scene, roles, mut anim) = setup();
        anim.apply(&mut scene, &roles, true, DT, 2.5, 0.0);
        let expected = DT * 15.0 * 2.5;
        assert!((anim.walk_phase() - expected).abs() < 1e-6);

        let arm = scene.get(roles.arms[0]).unwrap().transform.rotation;
        let leg = scene.get(roles.legs[0]).unwrap().transform.rotation;
        assert_ne!(arm, Quat::IDENTITY);
        assert_ne!(leg, Quat::IDENTITY);
    }

    #[test]
    fn walking_bob_is_never_below_rest() {
        let (mut scene, roles, mut anim) = setup();
        for _ in 0..200 {
            anim.apply(&mut scene, &roles, true, DT, 2.5, 0.0);
            let y = root_y(&scene);
            assert!(y >= 0.0);
            assert!(y <= 0.1 + 1e-6);
        }
    }

    #[test]
    fn long_walks_wrap_phase_without_a_jump() {
        let (mut scene, roles, mut anim) = setup();
        let step = DT * 15.0 * 5.0;
        for _ in 0..2000 {
            anim.apply(&mut scene, &roles, true, DT, 5.0, 0.0);
            assert!((0.0..WALK_PERIOD).contains(&anim.walk_phase()));
        }
        let unwrapped = step as f64 * 2000.0;
        let expected = (unwrapped.sin().abs() * 0.1) as f32;
        assert!((root_y(&scene) - expected).abs() < 1e-3);
    }

    #[test]
    fn arms_and_legs_swing_in_opposition() {
        let (mut scene, roles, mut anim) = setup();
        for _ in 0..7 {
            anim.apply(&mut scene, &roles, true, DT, 2.5, 0.0);
        }
        let (arm_axis, arm_angle) = scene
            .get(roles.arms[0])
            .unwrap()
            .transform
            .rotation
            .to_axis_angle();
        let (leg_axis, leg_angle) = scene
            .get(roles.legs[0])
            .unwrap()
            .transform
            .rotation
            .to_axis_angle();
        // Opposite signs show up as opposite axes.
        assert!(arm_angle > 0.0 && leg_angle > 0.0);
        assert!(arm_axis.dot(leg_axis) < 0.0);
    }

    #[test]
    fn idle_breathes_and_resets_limbs() {
        let (mut scene, roles, mut anim) = setup();
        for _ in 0..10 {
            anim.apply(&mut scene, &roles, true, DT, 2.5, 0.0);
        }
        let phase = anim.walk_phase();

        let elapsed = PI / 4.0;
        anim.apply(&mut scene, &roles, false, DT, 0.0, elapsed);
        let expected = (elapsed * 2.0).sin() * 0.02;
        assert!((root_y(&scene) - expected).abs() < 1e-6);
        assert_eq!(anim.walk_phase(), phase);
        for id in roles.arms.iter().chain(&roles.legs) {
            assert_eq!(scene.get(*id).unwrap().transform.rotation, Quat::IDENTITY);
        }
        assert_eq!(
            scene.get(scene.root()).unwrap().transform.rotation,
            Quat::IDENTITY
        );
    }

    #[test]
    fn non_limb_nodes_are_untouched() {
        let (mut scene, roles, mut anim) = setup();
        let before: Vec<Transform> = scene.iter().map(|(_, n)| n.transform).collect();
        for _ in 0..30 {
            anim.apply(&mut scene, &roles, true, DT, 5.0, 0.0);
        }
        for (id, node) in scene.iter() {
            let is_animated =
                id == scene.root() || roles.arms.contains(&id) || roles.legs.contains(&id);
            if !is_animated {
                assert_eq!(node.transform, before[id.0], "{} moved", node.name);
            }
        }
    }
}

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Follow-camera tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position relative to the avatar (up and behind).
    pub offset: Vec3,
    /// Point looked at, relative to the avatar's feet.
    pub look_offset: Vec3,
    /// Exponential approach rate (1/s).
    pub damping: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 3.0, 5.0),
            look_offset: Vec3::new(0.0, 1.0, 0.0),
            damping: 2.0,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Camera pose after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Third-person camera chasing a point behind and above the avatar.
/// Camera motion is presentation only and never feeds back into the avatar.
#[derive(Debug, Clone)]
pub struct CameraRig {
    config: CameraConfig,
    state: CameraState,
    aspect: f32,
}

impl CameraRig {
    /// Create a rig already in place behind `avatar`.
    pub fn new(config: CameraConfig, avatar: Vec3) -> Self {
        let mut rig = Self {
            state: CameraState {
                position: Vec3::ZERO,
                look_at: Vec3::ZERO,
            },
            config,
            aspect: 16.0 / 9.0,
        };
        rig.snap_to(avatar);
        rig
    }

    /// Jump straight to the follow pose for `avatar`.
    pub fn snap_to(&mut self, avatar: Vec3) {
        tracing::debug!(?avatar, "camera snapped to avatar");
        self.state = CameraState {
            position: avatar + self.config.offset,
            look_at: avatar + self.config.look_offset,
        };
    }

    /// Move toward the follow pose for `avatar`.
    pub fn tick(&mut self, dt: f32, avatar: Vec3) -> CameraState {
        let target = avatar + self.config.offset;
        let t = 1.0 - (-self.config.damping * dt.max(0.0)).exp();
        self.state = CameraState {
            position: self.state.position.lerp(target, t),
            look_at: avatar + self.config.look_offset,
        };
        self.state
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.state.position, self.state.look_at, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_snapped_behind_avatar() {
        let rig = CameraRig::new(CameraConfig::default(), Vec3::ZERO);
        assert_eq!(rig.state().position, Vec3::new(0.0, 3.0, 5.0));
        assert_eq!(rig.state().look_at, Vec3::new(0.0, 1.0, 0.0));
        let vp = rig.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn chases_without_teleporting() {
        let mut rig = CameraRig::new(CameraConfig::default(), Vec3::ZERO);
        let avatar = Vec3::new(0.0, 0.0, -10.0);
        let target = avatar + Vec3::new(0.0, 3.0, 5.0);
        let mut last_gap = (rig.state().position - target).length();
        for _ in 0..120 {
            let s = rig.tick(1.0 / 60.0, avatar);
            let gap = (s.position - target).length();
            assert!(gap < last_gap);
            assert!(gap > 0.0);
            last_gap = gap;
        }
    }

    #[test]
    fn closes_expected_fraction() {
        let mut rig = CameraRig::new(CameraConfig::default(), Vec3::ZERO);
        let s = rig.tick(0.5, Vec3::new(10.0, 0.0, 0.0));
        let expected = 10.0 * (1.0 - (-1.0f32).exp());
        assert!((s.position.x - expected).abs() < 1e-4);
        assert_eq!(s.look_at, Vec3::new(10.0, 1.0, 0.0));
    }

    #[test]
    fn zero_dt_holds_position() {
        let mut rig = CameraRig::new(CameraConfig::default(), Vec3::ZERO);
        let before = rig.state().position;
        let s = rig.tick(0.0, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(s.position, before);
    }

    #[test]
    fn aspect_rejects_degenerate_values() {
        let mut rig = CameraRig::new(CameraConfig::default(), Vec3::ZERO);
        rig.set_aspect(0.0);
        rig.set_aspect(f32::NAN);
        assert!(!rig.projection_matrix().col(0).x.is_nan());
    }
}

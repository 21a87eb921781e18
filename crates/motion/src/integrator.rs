use glam::{Quat, Vec2, Vec3};
use questwalk_common::Transform;
use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;

/// Below this magnitude a coasting velocity is snapped to zero.
const SETTLE_EPSILON: f32 = 1e-5;

/// Avatar motion after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// Authoritative world position of the avatar.
    pub position: Vec3,
    /// Smoothed per-frame displacement.
    pub velocity: Vec3,
    pub is_moving: bool,
    /// HUD speed readout (`|velocity| * display_scale`).
    pub speed: f32,
    /// Yaw (radians) of the travel direction; the avatar faces −Z at zero.
    pub heading: f32,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            is_moving: false,
            speed: 0.0,
            heading: 0.0,
        }
    }
}

impl MotionState {
    /// Root transform of the avatar: position plus heading about +Y.
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: Quat::from_rotation_y(self.heading),
            ..Transform::default()
        }
    }
}

/// Integrates held-key direction into avatar position with damped velocity.
#[derive(Debug, Clone, Default)]
pub struct MotionIntegrator {
    config: MotionConfig,
    state: MotionState,
}

impl MotionIntegrator {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: MotionState::default(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Advance one frame.
    ///
    /// `direction` is a ground-plane vector (x right, y backward) of length 1
    /// or 0; longer vectors are clamped to unit length.
    pub fn tick(&mut self, dt: f32, direction: Vec2, run_held: bool) -> MotionState {
        let cfg = &self.config;
        let frames = cfg.frames_for(dt);
        let direction = direction.clamp_length_max(1.0);
        let mut velocity = self.state.velocity;

        if direction != Vec2::ZERO {
            let speed = if run_held { cfg.run_speed } else { cfg.base_speed };
            let target = Vec3::new(direction.x, 0.0, direction.y) * speed;
            let keep = cfg.acceleration.powf(frames);
            velocity = target + (velocity - target) * keep;
        } else {
            velocity *= cfg.deceleration.powf(frames);
            if velocity.length() < SETTLE_EPSILON {
                velocity = Vec3::ZERO;
            }
        }

        // Smoothing is a convex blend of vectors within the ceiling; the clamp
        // only absorbs float rounding.
        velocity = velocity.clamp_length_max(cfg.run_speed);

        let raw = velocity.length();
        let is_moving = raw > cfg.moving_epsilon;
        let heading = if is_moving {
            (-velocity.x).atan2(-velocity.z)
        } else {
            self.state.heading
        };

        if is_moving != self.state.is_moving {
            tracing::trace!(is_moving, speed = raw * cfg.display_scale, "motion state flipped");
        }

        self.state = MotionState {
            position: self.state.position + velocity * frames,
            velocity,
            is_moving,
            speed: raw * cfg.display_scale,
            heading,
        };
        self.state
    }

    /// Put the avatar back at the origin at rest.
    pub fn reset(&mut self) {
        self.state = MotionState::default();
    }
}

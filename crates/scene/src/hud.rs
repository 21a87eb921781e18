use glam::Vec3;
use questwalk_motion::MotionState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementStatus {
    Idle,
    Walking,
    Running,
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Walking => "Walking",
            Self::Running => "Running",
        };
        f.write_str(s)
    }
}

/// Plain-text readout for host HUDs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudReadout {
    pub position: Vec3,
    pub speed: f32,
    pub status: MovementStatus,
}

impl HudReadout {
    pub fn from_motion(motion: &MotionState, run_held: bool) -> Self {
        let status = match (motion.is_moving, run_held) {
            (false, _) => MovementStatus::Idle,
            (true, false) => MovementStatus::Walking,
            (true, true) => MovementStatus::Running,
        };
        Self {
            position: motion.position,
            speed: motion.speed,
            status,
        }
    }
}

impl fmt::Display for HudReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pos ({:.2}, {:.2}, {:.2}) | speed {:.1} | {}",
            self.position.x, self.position.y, self.position.z, self.speed, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_motion() {
        let idle = MotionState::default();
        assert_eq!(HudReadout::from_motion(&idle, true).status, MovementStatus::Idle);

        let moving = MotionState {
            is_moving: true,
            speed: 2.5,
            ..MotionState::default()
        };
        assert_eq!(
            HudReadout::from_motion(&moving, false).status,
            MovementStatus::Walking
        );
        assert_eq!(
            HudReadout::from_motion(&moving, true).status,
            MovementStatus::Running
        );
    }

    #[test]
    fn display_is_plain_text() {
        let hud = HudReadout {
            position: Vec3::new(1.0, 0.0, -2.5),
            speed: 5.0,
            status: MovementStatus::Running,
        };
        assert_eq!(hud.to_string(), "pos (1.00, 0.00, -2.50) | speed 5.0 | Running");
    }
}

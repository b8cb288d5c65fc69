// ==============================================================================
// camera.rs — CHASE CAMERA
// ------------------------------------------------------------------------------
// FollowVehicle: eye = chassis - dir * distance + Y * height
//                target = chassis + dir * look_ahead
//   dir = horizontal forward, flipped while reversing (forward · horizontal
//   velocity below reverse_dot at more than reverse_min_speed).
// FollowBall:    eye = chassis - dir * distance + Y * height, target = ball
//   dir = horizontal chassis -> ball.
//
// Recomputed from scratch every tick, no smoothing. When no direction can be
// derived (car pointing straight up, ball right above) the last one is reused.
// ==============================================================================

use rapier3d::prelude::{Point, Real, Vector};
use serde::Serialize;

use crate::body::ChassisState;
use crate::config::CameraConfig;
use crate::frame::{DirectionFrame, horizontal, world_up};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    FollowVehicle,
    FollowBall,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::FollowVehicle => CameraMode::FollowBall,
            CameraMode::FollowBall => CameraMode::FollowVehicle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point<Real>,
    pub target: Point<Real>,
}

#[derive(Debug, Clone)]
pub struct CameraFollowPolicy {
    config: CameraConfig,
    mode: CameraMode,
    state: Option<CameraState>,
    last_dir: Vector<Real>,
    modifier_held: bool,
}

impl CameraFollowPolicy {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            mode: CameraMode::default(),
            state: None,
            last_dir: Vector::new(0.0, 0.0, -1.0),
            modifier_held: false,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn state(&self) -> Option<CameraState> {
        self.state
    }

    pub fn toggle(&mut self) -> CameraMode {
        self.mode = self.mode.toggled();
        tracing::debug!(mode = ?self.mode, "camera mode");
        self.mode
    }

    /// Toggles on the rising edge of the camera-switch modifier only.
    pub fn observe_modifier(&mut self, held: bool) {
        if held && !self.modifier_held {
            self.toggle();
        }
        self.modifier_held = held;
    }

    /// `None` means the state was left as it was (ball mode without a ball
    /// and no previous state yet).
    pub fn update(
        &mut self,
        chassis: &ChassisState,
        frame: &DirectionFrame,
        ball: Option<Point<Real>>,
    ) -> Option<CameraState> {
        let next = match self.mode {
            CameraMode::FollowVehicle => Some(self.follow_vehicle(chassis, frame)),
            CameraMode::FollowBall => ball.map(|b| self.follow_ball(chassis, b)),
        };

        if next.is_some() {
            self.state = next;
        }
        self.state
    }

    fn follow_vehicle(&mut self, chassis: &ChassisState, frame: &DirectionFrame) -> CameraState {
        let mut dir = horizontal(&frame.forward).unwrap_or(self.last_dir);

        let flat_vel = chassis.linvel - world_up() * chassis.linvel.dot(&world_up());
        if flat_vel.norm() > self.config.reverse_min_speed
            && dir.dot(&flat_vel.normalize()) < self.config.reverse_dot
        {
            dir = -dir;
        }
        self.last_dir = dir;

        let origin = chassis.position();
        CameraState {
            position: origin - dir * self.config.distance + world_up() * self.config.height,
            target: origin + dir * self.config.look_ahead,
        }
    }

    fn follow_ball(&mut self, chassis: &ChassisState, ball: Point<Real>) -> CameraState {
        let origin = chassis.position();
        let dir = horizontal(&(ball - origin)).unwrap_or(self.last_dir);
        self.last_dir = dir;

        CameraState {
            position: origin - dir * self.config.distance + world_up() * self.config.height,
            target: ball,
        }
    }
}

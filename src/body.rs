// ==============================================================================
// body.rs — PHYSICS COLLABORATOR BOUNDARY
// ------------------------------------------------------------------------------
// ChassisBody is everything the control core needs from the physics side:
// read the chassis state + wheel transforms + contact count, and push
// forces / impulses / torques / per-wheel commands.
//
// The control policy never calls ChassisBody directly while deciding; it
// emits a list of VehicleCommand values that are applied afterwards, in
// order. Later commands win (e.g. a zeroed angular velocity issued after a
// velocity cap).
// ==============================================================================

use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{Isometry, Point, Real, Vector};

use crate::vehicle::WheelId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisState {
    pub pose: Isometry<Real>,
    pub linvel: Vector<Real>,
    pub angvel: Vector<Real>,
}

impl ChassisState {
    pub fn at_rest(pose: Isometry<Real>) -> Self {
        Self { pose, linvel: Vector::zeros(), angvel: Vector::zeros() }
    }

    #[inline]
    pub fn position(&self) -> Point<Real> {
        Point::from(self.pose.translation.vector)
    }

    #[inline]
    pub fn rotation(&self) -> &UnitQuaternion<Real> {
        &self.pose.rotation
    }

    /// Height of the chassis origin above world y = 0.
    #[inline]
    pub fn height(&self) -> Real {
        self.pose.translation.vector.y
    }
}

pub trait ChassisBody {
    fn state(&self) -> ChassisState;

    /// World transform of one wheel (center + orientation incl. steering).
    fn wheel_transform(&self, wheel: WheelId) -> Isometry<Real>;

    fn wheels_in_contact(&self) -> usize;

    fn wheel_count(&self) -> usize {
        WheelId::ALL.len()
    }

    fn wheel_positions(&self) -> [Point<Real>; 4] {
        WheelId::ALL.map(|id| Point::from(self.wheel_transform(id).translation.vector))
    }

    fn apply_force(&mut self, force: Vector<Real>, at: Option<Point<Real>>);
    fn apply_impulse(&mut self, impulse: Vector<Real>, at: Option<Point<Real>>);
    fn apply_torque(&mut self, torque: Vector<Real>);
    fn apply_torque_impulse(&mut self, torque_impulse: Vector<Real>);

    /// Drop user forces (resp. torques) accumulated on the chassis.
    fn reset_forces(&mut self);
    fn reset_torques(&mut self);

    fn set_linvel(&mut self, linvel: Vector<Real>);
    fn set_angvel(&mut self, angvel: Vector<Real>);

    fn set_steering(&mut self, wheel: WheelId, value: Real);
    fn set_brake(&mut self, wheel: WheelId, value: Real);
    fn set_engine_force(&mut self, wheel: WheelId, value: Real);

    /// Teleport to `pose`, zero velocities, forces and wheel commands.
    fn reset_to(&mut self, pose: &Isometry<Real>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleCommand {
    ClearForces,
    ClearTorques,
    Force { force: Vector<Real>, at: Option<Point<Real>> },
    Impulse { impulse: Vector<Real>, at: Option<Point<Real>> },
    Torque(Vector<Real>),
    TorqueImpulse(Vector<Real>),
    LinearVelocity(Vector<Real>),
    AngularVelocity(Vector<Real>),
    EngineForce { wheel: WheelId, value: Real },
    Brake { wheel: WheelId, value: Real },
    Steering { wheel: WheelId, value: Real },
    ResetTo(Isometry<Real>),
}

impl VehicleCommand {
    pub fn apply<B: ChassisBody + ?Sized>(&self, body: &mut B) {
        match *self {
            VehicleCommand::ClearForces => {
                body.reset_forces();
                body.reset_torques();
            }
            VehicleCommand::ClearTorques => body.reset_torques(),
            VehicleCommand::Force { force, at } => body.apply_force(force, at),
            VehicleCommand::Impulse { impulse, at } => body.apply_impulse(impulse, at),
            VehicleCommand::Torque(t) => body.apply_torque(t),
            VehicleCommand::TorqueImpulse(t) => body.apply_torque_impulse(t),
            VehicleCommand::LinearVelocity(v) => body.set_linvel(v),
            VehicleCommand::AngularVelocity(w) => body.set_angvel(w),
            VehicleCommand::EngineForce { wheel, value } => body.set_engine_force(wheel, value),
            VehicleCommand::Brake { wheel, value } => body.set_brake(wheel, value),
            VehicleCommand::Steering { wheel, value } => body.set_steering(wheel, value),
            VehicleCommand::ResetTo(pose) => body.reset_to(&pose),
        }
    }
}

pub fn apply_all<B: ChassisBody + ?Sized>(commands: &[VehicleCommand], body: &mut B) {
    for command in commands {
        command.apply(body);
    }
}

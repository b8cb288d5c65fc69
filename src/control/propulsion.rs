// ==============================================================================
// propulsion.rs — ENGINE / STEERING / BRAKE
// ------------------------------------------------------------------------------
// Wheel commands are re-issued every tick, so an Up edge (or no edge at all)
// always lands as an explicit zero on the same tick it is observed.
// Engine sign: negative = toward the front of the car.
// ==============================================================================

use rapier3d::prelude::Real;

use super::TickOutput;
use crate::body::VehicleCommand;
use crate::config::VehicleConfig;
use crate::input::{Control, InputState};
use crate::vehicle::WheelId;

pub fn drive(input: &InputState, cfg: &VehicleConfig, out: &mut TickOutput) {
    let engine = engine_force(input, cfg);
    for wheel in WheelId::ALL {
        out.push(VehicleCommand::EngineForce { wheel, value: engine });
    }

    let steer = steering(input, cfg);
    for wheel in WheelId::FRONT {
        out.push(VehicleCommand::Steering { wheel, value: steer });
    }

    let brake = if input.modifiers().brake { cfg.brake_force } else { 0.0 };
    for wheel in WheelId::ALL {
        out.push(VehicleCommand::Brake { wheel, value: brake });
    }

    for control in [Control::Accelerate, Control::Reverse, Control::SteerLeft, Control::SteerRight] {
        out.release_if_up(input, control);
    }
}

/// Both pedals down cancel out.
pub fn engine_force(input: &InputState, cfg: &VehicleConfig) -> Real {
    match (input.is_down(Control::Accelerate), input.is_down(Control::Reverse)) {
        (true, false) => -cfg.max_engine_force,
        (false, true) => cfg.max_engine_force,
        _ => 0.0,
    }
}

/// Positive = left.
pub fn steering(input: &InputState, cfg: &VehicleConfig) -> Real {
    match (input.is_down(Control::SteerLeft), input.is_down(Control::SteerRight)) {
        (true, false) => cfg.max_steer_value,
        (false, true) => -cfg.max_steer_value,
        _ => 0.0,
    }
}

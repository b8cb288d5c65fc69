// ==============================================================================
// aerial.rs — AIR ATTITUDE CONTROL
// ------------------------------------------------------------------------------
// pitch: accelerate/reverse about right   (accelerate = nose down)
// yaw:   steer left/right about up        (left = nose left)
// roll:  roll keys about forward          (roll right = roof toward right)
//
// Inactive while all four wheels are down and during the flip immobility
// window. The roll keys are only read here, so their Up edges are released
// here even when the torques are suppressed.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use super::{TickContext, TickOutput};
use crate::body::VehicleCommand;
use crate::config::VehicleConfig;
use crate::input::{Control, InputState};
use crate::timing::TimingState;

pub fn attitude(
    input: &InputState,
    ctx: &TickContext,
    cfg: &VehicleConfig,
    timing: &TimingState,
    out: &mut TickOutput,
) {
    out.release_if_up(input, Control::RollLeft);
    out.release_if_up(input, Control::RollRight);

    if ctx.all_grounded() || timing.in_flip_immobility(ctx.now, cfg) {
        return;
    }

    let torque = attitude_torque(input, ctx, cfg);
    if torque != Vector::zeros() {
        out.push(VehicleCommand::Torque(torque));
    }
}

fn axis(input: &InputState, positive: Control, negative: Control) -> Real {
    let mut v = 0.0;
    if input.is_down(positive) {
        v += 1.0;
    }
    if input.is_down(negative) {
        v -= 1.0;
    }
    v
}

pub fn attitude_torque(input: &InputState, ctx: &TickContext, cfg: &VehicleConfig) -> Vector<Real> {
    let f = &ctx.frame;

    let pitch = axis(input, Control::Reverse, Control::Accelerate);
    let yaw = axis(input, Control::SteerLeft, Control::SteerRight);
    let roll = axis(input, Control::RollRight, Control::RollLeft);

    f.right * (pitch * cfg.air_pitch_torque)
        + f.up * (yaw * cfg.air_yaw_torque)
        + f.forward * (roll * cfg.air_roll_torque)
}

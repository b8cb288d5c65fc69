// ==============================================================================
// self_righting.rs — UPSIDE-DOWN RECOVERY
// ------------------------------------------------------------------------------
// trigger (jump pressed, stuck upside down, latch clear, not already active):
//   world-up impulse now, forward-axis torque impulse after the configured
//   delay (timer lives in TimingState, so a reset cancels it).
// completion (up realigned with world up): torques cleared and angular
//   velocity forced to zero on the same tick, flag dropped.
//
// There is no give-up timeout: a car that never realigns stays in
// self-righting until it lands on all four wheels or is reset.
// ==============================================================================

use super::{TickContext, TickOutput};
use crate::body::VehicleCommand;
use crate::config::VehicleConfig;
use crate::frame::world_up;
use crate::timing::TimingState;
use rapier3d::prelude::{Real, Vector};

pub fn can_begin(ctx: &TickContext, cfg: &VehicleConfig, timing: &TimingState) -> bool {
    !timing.is_self_righting && timing.latch_clear() && ctx.is_stuck_upside_down(cfg)
}

/// Caller has already seen a jump press this tick.
pub fn try_begin(
    ctx: &TickContext,
    cfg: &VehicleConfig,
    timing: &mut TimingState,
    out: &mut TickOutput,
) -> bool {
    if !can_begin(ctx, cfg, timing) {
        return false;
    }

    timing.begin_self_righting(ctx.now, cfg.self_righting_delay());
    out.push(VehicleCommand::Impulse { impulse: world_up() * cfg.self_righting_force, at: None });

    tracing::debug!(
        up_y = ctx.frame.up.y,
        height = ctx.chassis.height(),
        "self-righting started"
    );
    true
}

pub fn update(ctx: &TickContext, cfg: &VehicleConfig, timing: &mut TimingState, out: &mut TickOutput) {
    if !timing.is_self_righting {
        return;
    }

    if timing.take_due_torque(ctx.now) {
        out.push(VehicleCommand::TorqueImpulse(righting_torque(ctx, cfg)));
    }

    if ctx.frame.is_upright(cfg.upright_dot) {
        timing.finish_self_righting();
        out.push(VehicleCommand::ClearTorques);
        out.push(VehicleCommand::AngularVelocity(Vector::zeros()));
        tracing::debug!("self-righting complete");
    }
}

/// Roll toward whichever side is already higher: +roll turns up toward right.
fn righting_torque(ctx: &TickContext, cfg: &VehicleConfig) -> Vector<Real> {
    let sign: Real = if ctx.frame.right.y >= 0.0 { 1.0 } else { -1.0 };
    ctx.frame.forward * (sign * cfg.self_righting_torque)
}

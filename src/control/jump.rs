// ==============================================================================
// jump.rs — JUMP / DOUBLE JUMP / FLIP
// ------------------------------------------------------------------------------
// Jump key, checked in this order on a press with the latch clear:
//
//   stuck upside down      -> self-righting (see self_righting.rs)
//   all wheels grounded    -> jump: impulse along up, then a rising force
//                             while held, for at most max_jump_duration
//   airborne + window open -> double jump: neutral impulse, or a flip when
//   + double jump unused      a direction key is held (never both)
//
// Release: stops the rising force, re-arms the latch, edge is consumed.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use super::{TickContext, TickOutput, self_righting};
use crate::body::VehicleCommand;
use crate::config::VehicleConfig;
use crate::frame::horizontal;
use crate::input::{Control, InputState};
use crate::timing::TimingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipKind {
    Front,
    Back,
    Left,
    Right,
}

impl FlipKind {
    /// Pitch keys win over steer keys; opposing keys cancel.
    pub fn from_input(input: &InputState) -> Option<Self> {
        let fwd = input.is_down(Control::Accelerate);
        let back = input.is_down(Control::Reverse);
        let left = input.is_down(Control::SteerLeft);
        let right = input.is_down(Control::SteerRight);

        match (fwd, back, left, right) {
            (true, false, _, _) => Some(FlipKind::Front),
            (false, true, _, _) => Some(FlipKind::Back),
            (_, _, true, false) => Some(FlipKind::Left),
            (_, _, false, true) => Some(FlipKind::Right),
            _ => None,
        }
    }
}

pub fn can_double_jump(ctx: &TickContext, cfg: &VehicleConfig, timing: &TimingState) -> bool {
    !ctx.all_grounded()
        && !ctx.is_stuck_upside_down(cfg)
        && !timing.has_used_double_jump
        && timing.latch_clear()
        && timing.in_double_jump_window(ctx.now, cfg)
}

pub fn update(
    input: &InputState,
    ctx: &TickContext,
    cfg: &VehicleConfig,
    timing: &mut TimingState,
    out: &mut TickOutput,
) {
    if input.is_up(Control::Jump) {
        timing.release_jump();
        out.release(Control::Jump);
        return;
    }

    if !input.is_down(Control::Jump) {
        timing.expire_jump();
        return;
    }

    if timing.latch_clear() {
        if self_righting::try_begin(ctx, cfg, timing, out) {
            return;
        }

        if ctx.all_grounded() {
            timing.record_jump(ctx.now);
            out.push(VehicleCommand::Impulse { impulse: ctx.frame.up * cfg.jump_impulse, at: None });
            tracing::debug!(now_ms = ctx.now.as_millis() as u64, "jump");
        } else if can_double_jump(ctx, cfg, timing) {
            double_jump(input, ctx, cfg, timing, out);
            return;
        }
    }

    if timing.jump_force_active(ctx.now, cfg) {
        out.push(VehicleCommand::Force { force: ctx.frame.up * cfg.jump_force, at: None });
    } else {
        timing.expire_jump();
    }
}

fn double_jump(
    input: &InputState,
    ctx: &TickContext,
    cfg: &VehicleConfig,
    timing: &mut TimingState,
    out: &mut TickOutput,
) {
    timing.record_double_jump();

    match FlipKind::from_input(input) {
        None => {
            out.push(VehicleCommand::Impulse { impulse: ctx.frame.up * cfg.double_jump_force, at: None });
            tracing::debug!("double jump");
        }
        Some(kind) => {
            let (impulse, torque) = flip_impulses(kind, ctx, cfg);
            out.push(VehicleCommand::Impulse { impulse, at: None });
            out.push(VehicleCommand::TorqueImpulse(torque));
            timing.record_flip(ctx.now);
            tracing::debug!(?kind, "flip");
        }
    }
}

/// (linear impulse, angular impulse) for one flip.
pub fn flip_impulses(kind: FlipKind, ctx: &TickContext, cfg: &VehicleConfig) -> (Vector<Real>, Vector<Real>) {
    let f = &ctx.frame;
    let flat_forward = horizontal(&f.forward).unwrap_or(f.forward);
    let flat_right = horizontal(&f.right).unwrap_or(f.right);

    match kind {
        // nose down = negative about right
        FlipKind::Front => (flat_forward * cfg.flip_force, f.right * -cfg.flip_torque),
        FlipKind::Back => (flat_forward * -cfg.flip_force, f.right * cfg.flip_torque),
        // roll right = positive about forward
        FlipKind::Right => (
            flat_right * cfg.side_flip_horizontal_force,
            f.forward * cfg.side_flip_torque,
        ),
        FlipKind::Left => (
            flat_right * -cfg.side_flip_horizontal_force,
            f.forward * -cfg.side_flip_torque,
        ),
    }
}

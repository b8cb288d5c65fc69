// ==============================================================================
// governor.rs — DOWNFORCE + VELOCITY CAPS
// ------------------------------------------------------------------------------
// Downforce: only with every wheel down, along -up, |F| = min(k * speed, max).
// Caps: checked every tick whatever the contact state, rescale preserving
// direction. `capped` is shared with PhysicsWorld, which re-applies the caps
// after each integration step.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use super::{TickContext, TickOutput};
use crate::body::VehicleCommand;
use crate::config::VehicleConfig;

pub fn downforce(ctx: &TickContext, cfg: &VehicleConfig, out: &mut TickOutput) {
    if !ctx.all_grounded() {
        return;
    }

    let speed = ctx.chassis.linvel.norm();
    let magnitude = (speed * cfg.downforce_per_speed).min(cfg.max_downforce);
    if magnitude > 0.0 {
        out.push(VehicleCommand::Force { force: -ctx.frame.up * magnitude, at: None });
    }
}

pub fn cap_velocities(ctx: &TickContext, cfg: &VehicleConfig, out: &mut TickOutput) {
    if let Some(v) = capped(&ctx.chassis.linvel, cfg.max_velocity) {
        out.push(VehicleCommand::LinearVelocity(v));
    }
    if let Some(w) = capped(&ctx.chassis.angvel, cfg.max_angular_velocity) {
        out.push(VehicleCommand::AngularVelocity(w));
    }
}

/// `Some(rescaled)` when |v| exceeds `max`, `None` when already within.
pub fn capped(v: &Vector<Real>, max: Real) -> Option<Vector<Real>> {
    let norm = v.norm();
    if norm > max && norm > 0.0 {
        Some(v * (max / norm))
    } else {
        None
    }
}

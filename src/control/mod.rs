//! control - the per-tick vehicle control policy.
//!
//! `ControlPolicy::evaluate` is pure with respect to the physics world: it
//! reads an input snapshot plus a `TickContext` sampled from the chassis, and
//! returns the commands to apply and the controls whose Up edge it consumed.
//! Evaluation order inside a tick:
//!
//! 1. reset (short-circuits the rest of the tick)
//! 2. clear last tick's forces/torques, contact bookkeeping
//! 3. ground propulsion (engine / steering / brake)
//! 4. downforce + velocity caps
//! 5. jump / double jump / flip / self-righting trigger
//! 6. aerial attitude torques (sees a flip issued this tick)
//! 7. self-righting timer + completion

pub mod aerial;
pub mod governor;
pub mod jump;
pub mod propulsion;
pub mod self_righting;

use std::time::Duration;

use rapier3d::prelude::Real;

use crate::body::{ChassisBody, ChassisState, VehicleCommand, apply_all};
use crate::config::VehicleConfig;
use crate::frame::DirectionFrame;
use crate::input::{Control, InputState};
use crate::reset::ResetPolicy;
use crate::timing::TimingState;
use crate::vehicle::WheelId;

/// Everything the policy reads from the physics side for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub now: Duration,
    pub chassis: ChassisState,
    pub frame: DirectionFrame,
    pub wheels_in_contact: usize,
    pub wheel_count: usize,
}

impl TickContext {
    pub fn sample<B: ChassisBody + ?Sized>(body: &B, now: Duration) -> Self {
        let chassis = body.state();
        let frame = DirectionFrame::resolve(&body.wheel_positions(), chassis.rotation());
        Self {
            now,
            chassis,
            frame,
            wheels_in_contact: body.wheels_in_contact(),
            wheel_count: body.wheel_count(),
        }
    }

    #[inline]
    pub fn all_grounded(&self) -> bool {
        self.wheel_count > 0 && self.wheels_in_contact >= self.wheel_count
    }

    #[inline]
    pub fn any_grounded(&self) -> bool {
        self.wheels_in_contact > 0
    }

    /// Roof facing the ground while sitting near ground level.
    pub fn is_stuck_upside_down(&self, cfg: &VehicleConfig) -> bool {
        self.frame.is_inverted(cfg.stuck_up_dot) && self.chassis.height() < cfg.stuck_height
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub commands: Vec<VehicleCommand>,
    /// Controls whose Up edge was acted on; the caller clears them.
    pub released: Vec<Control>,
    pub reset: bool,
}

impl TickOutput {
    pub fn push(&mut self, command: VehicleCommand) {
        self.commands.push(command);
    }

    pub fn release(&mut self, control: Control) {
        if !self.released.contains(&control) {
            self.released.push(control);
        }
    }

    pub(crate) fn release_if_up(&mut self, input: &InputState, control: Control) {
        if input.is_up(control) {
            self.release(control);
        }
    }

    pub fn engine_force(&self, wheel: WheelId) -> Option<Real> {
        self.commands.iter().rev().find_map(|c| match *c {
            VehicleCommand::EngineForce { wheel: w, value } if w == wheel => Some(value),
            _ => None,
        })
    }

    pub fn steering(&self, wheel: WheelId) -> Option<Real> {
        self.commands.iter().rev().find_map(|c| match *c {
            VehicleCommand::Steering { wheel: w, value } if w == wheel => Some(value),
            _ => None,
        })
    }

    pub fn brake(&self, wheel: WheelId) -> Option<Real> {
        self.commands.iter().rev().find_map(|c| match *c {
            VehicleCommand::Brake { wheel: w, value } if w == wheel => Some(value),
            _ => None,
        })
    }

    pub fn impulses(&self) -> impl Iterator<Item = &VehicleCommand> {
        self.commands.iter().filter(|c| matches!(c, VehicleCommand::Impulse { .. }))
    }

    pub fn torque_impulses(&self) -> impl Iterator<Item = &VehicleCommand> {
        self.commands.iter().filter(|c| matches!(c, VehicleCommand::TorqueImpulse(_)))
    }

    pub fn torques(&self) -> impl Iterator<Item = &VehicleCommand> {
        self.commands.iter().filter(|c| matches!(c, VehicleCommand::Torque(_)))
    }
}

pub struct ControlPolicy {
    config: VehicleConfig,
    timing: TimingState,
    reset: ResetPolicy,
}

impl ControlPolicy {
    pub fn new(config: VehicleConfig, reset: ResetPolicy) -> Self {
        Self { config, timing: TimingState::default(), reset }
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingState {
        &self.timing
    }

    pub fn evaluate(&mut self, input: &InputState, ctx: &TickContext) -> TickOutput {
        let mut out = TickOutput::default();
        let cfg = &self.config;

        if self.reset.poll(input, &mut out) {
            self.timing.reset();
            // a held jump key keeps the latch engaged across the reset
            self.timing.has_stopped_jumping = !input.is_down(Control::Jump);
            tracing::info!("vehicle reset to spawn");
            return out;
        }

        // user forces persist in the integrator until cleared
        out.push(VehicleCommand::ClearForces);

        if ctx.all_grounded() {
            self.timing.on_all_wheels_grounded();
        } else if ctx.any_grounded() {
            self.timing.on_wheel_contact();
        }

        propulsion::drive(input, cfg, &mut out);

        governor::downforce(ctx, cfg, &mut out);
        governor::cap_velocities(ctx, cfg, &mut out);

        jump::update(input, ctx, cfg, &mut self.timing, &mut out);

        aerial::attitude(input, ctx, cfg, &self.timing, &mut out);

        self_righting::update(ctx, cfg, &mut self.timing, &mut out);

        out
    }

    /// Sample, decide, apply.
    pub fn tick<B: ChassisBody + ?Sized>(
        &mut self,
        input: &InputState,
        body: &mut B,
        now: Duration,
    ) -> TickOutput {
        let ctx = TickContext::sample(body, now);
        let out = self.evaluate(input, &ctx);
        apply_all(&out.commands, body);
        out
    }
}

//! Reset-to-spawn on the reset key.
//!
//! Fires once per press: the Down edge triggers a reset and disarms, the Up
//! edge re-arms. The owning policy clears its TimingState in the same tick.

use rapier3d::prelude::{Isometry, Real};

use crate::body::VehicleCommand;
use crate::control::TickOutput;
use crate::input::{Control, InputState};

#[derive(Debug, Clone, PartialEq)]
pub struct ResetPolicy {
    initial: Isometry<Real>,
    armed: bool,
}

impl ResetPolicy {
    pub fn new(initial: Isometry<Real>) -> Self {
        Self { initial, armed: true }
    }

    pub fn initial(&self) -> &Isometry<Real> {
        &self.initial
    }

    /// Returns true when a reset was issued this tick.
    pub fn poll(&mut self, input: &InputState, out: &mut TickOutput) -> bool {
        if input.is_up(Control::Reset) {
            self.armed = true;
            out.release(Control::Reset);
            return false;
        }

        if input.is_down(Control::Reset) && self.armed {
            self.armed = false;
            out.push(VehicleCommand::ResetTo(self.initial));
            out.reset = true;
            return true;
        }

        false
    }
}

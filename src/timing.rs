// ==============================================================================
// timing.rs — JUMP / FLIP / SELF-RIGHTING TIMING STATE
// ------------------------------------------------------------------------------
// Timestamps are simulation time (Duration since the loop started) and every
// window is checked by comparing against `now` at evaluation time. The one
// deferred action (self-righting torque) is the `pending_torque_at` timer,
// polled each tick and cancelled by clearing the field.
//
// Latch: `has_stopped_jumping` is the "latch clear" flag. A jump, double jump
// or self-righting engages it (false); only a jump key release re-arms it.
// ==============================================================================

use std::time::Duration;

use serde::Serialize;

use crate::config::VehicleConfig;

/// Observable name of where the jump state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverPhase {
    GroundedReady,
    JumpRising,
    AirbornePostJump,
    DoubleJumpAvailable,
    DoubleJumpConsumed,
    SelfRighting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingState {
    pub last_jump_at: Option<Duration>,
    pub last_flip_at: Option<Duration>,
    pub is_jumping: bool,
    pub has_stopped_jumping: bool,
    pub has_used_double_jump: bool,
    pub is_self_righting: bool,
    pub pending_torque_at: Option<Duration>,
}

impl Default for TimingState {
    fn default() -> Self {
        Self {
            last_jump_at: None,
            last_flip_at: None,
            is_jumping: false,
            has_stopped_jumping: true,
            has_used_double_jump: false,
            is_self_righting: false,
            pending_torque_at: None,
        }
    }
}

impl TimingState {
    pub fn since_jump(&self, now: Duration) -> Option<Duration> {
        self.last_jump_at.map(|t| now.saturating_sub(t))
    }

    pub fn since_flip(&self, now: Duration) -> Option<Duration> {
        self.last_flip_at.map(|t| now.saturating_sub(t))
    }

    #[inline]
    pub fn latch_clear(&self) -> bool {
        self.has_stopped_jumping
    }

    /// Open interval: both window edges are excluded.
    pub fn in_double_jump_window(&self, now: Duration, cfg: &VehicleConfig) -> bool {
        match self.since_jump(now) {
            Some(elapsed) => elapsed > cfg.min_double_jump() && elapsed < cfg.max_double_jump(),
            None => false,
        }
    }

    pub fn in_flip_immobility(&self, now: Duration, cfg: &VehicleConfig) -> bool {
        matches!(self.since_flip(now), Some(elapsed) if elapsed < cfg.flip_immobility())
    }

    pub fn jump_force_active(&self, now: Duration, cfg: &VehicleConfig) -> bool {
        self.is_jumping
            && matches!(self.since_jump(now), Some(elapsed) if elapsed < cfg.max_jump_duration())
    }

    pub fn record_jump(&mut self, now: Duration) {
        self.last_jump_at = Some(now);
        self.is_jumping = true;
        self.has_stopped_jumping = false;
    }

    /// Jump key released: stop the rising force and re-arm the latch.
    pub fn release_jump(&mut self) {
        self.is_jumping = false;
        self.has_stopped_jumping = true;
    }

    pub fn expire_jump(&mut self) {
        self.is_jumping = false;
    }

    pub fn record_double_jump(&mut self) {
        self.has_used_double_jump = true;
        self.has_stopped_jumping = false;
        self.is_jumping = false;
    }

    pub fn record_flip(&mut self, now: Duration) {
        self.last_flip_at = Some(now);
    }

    pub fn begin_self_righting(&mut self, now: Duration, delay: Duration) {
        self.is_self_righting = true;
        self.last_jump_at = None;
        self.is_jumping = false;
        self.has_stopped_jumping = false;
        self.pending_torque_at = Some(now + delay);
    }

    /// True exactly once, on the first tick at or after the scheduled time.
    pub fn take_due_torque(&mut self, now: Duration) -> bool {
        match self.pending_torque_at {
            Some(at) if now >= at => {
                self.pending_torque_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn finish_self_righting(&mut self) {
        self.is_self_righting = false;
        self.pending_torque_at = None;
    }

    /// At least one wheel touching: the double jump is available again for
    /// the next airborne phase. The jump latch is untouched.
    pub fn on_wheel_contact(&mut self) {
        self.has_used_double_jump = false;
    }

    /// All wheels touching: back to neutral. Timestamps are kept, they age
    /// out through the window comparisons.
    pub fn on_all_wheels_grounded(&mut self) {
        self.has_used_double_jump = false;
        self.finish_self_righting();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self, now: Duration, grounded: bool, cfg: &VehicleConfig) -> ManeuverPhase {
        if self.is_self_righting {
            return ManeuverPhase::SelfRighting;
        }
        if self.jump_force_active(now, cfg) {
            return ManeuverPhase::JumpRising;
        }
        if grounded {
            return ManeuverPhase::GroundedReady;
        }
        if self.has_used_double_jump {
            ManeuverPhase::DoubleJumpConsumed
        } else if self.in_double_jump_window(now, cfg) {
            ManeuverPhase::DoubleJumpAvailable
        } else {
            ManeuverPhase::AirbornePostJump
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fresh_state_has_clear_latch_and_no_window() {
        let t = TimingState::default();
        assert!(t.latch_clear());
        assert!(!t.in_double_jump_window(ms(500), &VehicleConfig::ARCADE));
        assert!(!t.in_flip_immobility(ms(0), &VehicleConfig::ARCADE));
    }

    #[test]
    fn double_jump_window_excludes_both_edges() {
        let cfg = VehicleConfig::ARCADE; // 100..1500 ms
        let mut t = TimingState::default();
        t.record_jump(ms(1000));

        assert!(!t.in_double_jump_window(ms(1100), &cfg));
        assert!(t.in_double_jump_window(ms(1101), &cfg));
        assert!(t.in_double_jump_window(ms(2499), &cfg));
        assert!(!t.in_double_jump_window(ms(2500), &cfg));
    }

    #[test]
    fn jump_force_stops_at_duration() {
        let cfg = VehicleConfig::ARCADE; // 200 ms
        let mut t = TimingState::default();
        t.record_jump(ms(0));
        assert!(t.jump_force_active(ms(199), &cfg));
        assert!(!t.jump_force_active(ms(200), &cfg));
    }

    #[test]
    fn latch_rearms_only_on_release() {
        let mut t = TimingState::default();
        t.record_jump(ms(0));
        assert!(!t.latch_clear());

        t.on_all_wheels_grounded();
        assert!(!t.latch_clear());

        t.release_jump();
        assert!(t.latch_clear());
        assert!(!t.is_jumping);
    }

    #[test]
    fn contact_rearms_double_jump() {
        let mut t = TimingState::default();
        t.record_double_jump();
        assert!(t.has_used_double_jump);
        t.on_wheel_contact();
        assert!(!t.has_used_double_jump);
    }

    #[test]
    fn pending_torque_fires_once() {
        let mut t = TimingState::default();
        t.begin_self_righting(ms(1000), ms(250));
        assert_eq!(t.last_jump_at, None);

        assert!(!t.take_due_torque(ms(1249)));
        assert!(t.take_due_torque(ms(1250)));
        assert!(!t.take_due_torque(ms(1300)));
        assert!(t.is_self_righting);
    }

    #[test]
    fn reset_cancels_everything() {
        let mut t = TimingState::default();
        t.record_jump(ms(10));
        t.record_flip(ms(20));
        t.begin_self_righting(ms(30), ms(250));

        t.reset();

        assert_eq!(t, TimingState::default());
        assert!(!t.take_due_torque(ms(10_000)));
    }

    #[test]
    fn phase_tracks_jump_lifecycle() {
        let cfg = VehicleConfig::ARCADE;
        let mut t = TimingState::default();
        assert_eq!(t.phase(ms(0), true, &cfg), ManeuverPhase::GroundedReady);

        t.record_jump(ms(0));
        assert_eq!(t.phase(ms(50), false, &cfg), ManeuverPhase::JumpRising);

        t.release_jump();
        assert_eq!(t.phase(ms(80), false, &cfg), ManeuverPhase::AirbornePostJump);
        assert_eq!(t.phase(ms(300), false, &cfg), ManeuverPhase::DoubleJumpAvailable);

        t.record_double_jump();
        assert_eq!(t.phase(ms(400), false, &cfg), ManeuverPhase::DoubleJumpConsumed);
        assert_eq!(t.phase(ms(3000), false, &cfg), ManeuverPhase::DoubleJumpConsumed);
    }
}

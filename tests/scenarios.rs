//! End-to-end control scenarios against a recording chassis: every command
//! the policy issues lands on this fake, and the tests inspect what it saw.

use std::time::Duration;

use approx::assert_relative_eq;
use arcade_drive::body::{ChassisBody, ChassisState};
use arcade_drive::control::ControlPolicy;
use arcade_drive::reset::ResetPolicy;
use arcade_drive::vehicle::WheelId;
use arcade_drive::{Control, Edge, InputState, VehicleConfig};
use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{Isometry, Point, Real, Vector};

#[derive(Debug, Default, Clone)]
struct WheelCommands {
    engine: Real,
    steering: Real,
    brake: Real,
}

#[derive(Debug)]
struct RecordingBody {
    cfg: VehicleConfig,
    pose: Isometry<Real>,
    linvel: Vector<Real>,
    angvel: Vector<Real>,
    in_contact: usize,
    wheels: [WheelCommands; 4],
    forces: Vec<Vector<Real>>,
    torques: Vec<Vector<Real>>,
    impulses: Vec<Vector<Real>>,
    torque_impulses: Vec<Vector<Real>>,
    resets: usize,
}

impl RecordingBody {
    fn new(pose: Isometry<Real>, in_contact: usize) -> Self {
        Self {
            cfg: VehicleConfig::ARCADE,
            pose,
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            in_contact,
            wheels: Default::default(),
            forces: Vec::new(),
            torques: Vec::new(),
            impulses: Vec::new(),
            torque_impulses: Vec::new(),
            resets: 0,
        }
    }

    fn grounded() -> Self {
        Self::new(Isometry::translation(0.0, 0.7, 0.0), 4)
    }

    fn airborne() -> Self {
        Self::new(Isometry::translation(0.0, 4.0, 0.0), 0)
    }

    /// Roof down on the ground, right side tipped slightly up.
    fn upside_down() -> Self {
        let rot = UnitQuaternion::from_axis_angle(&Vector::z_axis(), 0.95 * std::f32::consts::PI);
        Self::new(Isometry::from_parts(Vector::new(0.0, 0.5, 0.0).into(), rot), 0)
    }

    fn clear_log(&mut self) {
        self.impulses.clear();
        self.torque_impulses.clear();
        self.forces.clear();
        self.torques.clear();
    }
}

impl ChassisBody for RecordingBody {
    fn state(&self) -> ChassisState {
        ChassisState { pose: self.pose, linvel: self.linvel, angvel: self.angvel }
    }

    fn wheel_transform(&self, wheel: WheelId) -> Isometry<Real> {
        let center = self.pose * wheel.mount(&self.cfg);
        Isometry::from_parts(center.coords.into(), self.pose.rotation)
    }

    fn wheels_in_contact(&self) -> usize {
        self.in_contact
    }

    fn apply_force(&mut self, force: Vector<Real>, _at: Option<Point<Real>>) {
        self.forces.push(force);
    }

    fn apply_impulse(&mut self, impulse: Vector<Real>, _at: Option<Point<Real>>) {
        self.impulses.push(impulse);
    }

    fn apply_torque(&mut self, torque: Vector<Real>) {
        self.torques.push(torque);
    }

    fn apply_torque_impulse(&mut self, torque_impulse: Vector<Real>) {
        self.torque_impulses.push(torque_impulse);
    }

    fn reset_forces(&mut self) {
        self.forces.clear();
    }

    fn reset_torques(&mut self) {
        self.torques.clear();
    }

    fn set_linvel(&mut self, linvel: Vector<Real>) {
        self.linvel = linvel;
    }

    fn set_angvel(&mut self, angvel: Vector<Real>) {
        self.angvel = angvel;
    }

    fn set_steering(&mut self, wheel: WheelId, value: Real) {
        self.wheels[wheel.index()].steering = value;
    }

    fn set_brake(&mut self, wheel: WheelId, value: Real) {
        self.wheels[wheel.index()].brake = value;
    }

    fn set_engine_force(&mut self, wheel: WheelId, value: Real) {
        self.wheels[wheel.index()].engine = value;
    }

    fn reset_to(&mut self, pose: &Isometry<Real>) {
        self.pose = *pose;
        self.linvel = Vector::zeros();
        self.angvel = Vector::zeros();
        self.wheels = Default::default();
        self.resets += 1;
    }
}

struct Rig {
    policy: ControlPolicy,
    input: InputState,
    body: RecordingBody,
}

impl Rig {
    fn new(body: RecordingBody) -> Self {
        let spawn = Isometry::translation(0.0, 1.2, 0.0);
        Self {
            policy: ControlPolicy::new(VehicleConfig::ARCADE, ResetPolicy::new(spawn)),
            input: InputState::new(),
            body,
        }
    }

    fn press(&mut self, control: Control) {
        self.input.set(control, Edge::Down);
    }

    fn release(&mut self, control: Control) {
        self.input.set(control, Edge::Up);
    }

    /// One tick the way the server runs it: evaluate, apply, clear consumed edges.
    fn tick(&mut self, now_ms: u64) {
        let out = self.policy.tick(&self.input, &mut self.body, ms(now_ms));
        self.input.clear_released(&out.released);
    }

    fn engine(&self) -> [Real; 4] {
        self.body.wheels.clone().map(|w| w.engine)
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Grounded jump at `at`, released one tick later, then airborne.
fn jump_and_release(rig: &mut Rig, at: u64) {
    rig.press(Control::Jump);
    rig.tick(at);
    rig.release(Control::Jump);
    rig.body.in_contact = 0;
    rig.body.pose = Isometry::translation(0.0, 3.0, 0.0);
    rig.tick(at + 16);
    rig.body.clear_log();
}

#[test]
fn opposing_pedals_never_drive() {
    let mut rig = Rig::new(RecordingBody::grounded());
    rig.press(Control::Accelerate);
    rig.press(Control::Reverse);
    for t in 0..10 {
        rig.tick(t * 16);
        assert_eq!(rig.engine(), [0.0; 4]);
    }
}

#[test]
fn tap_w_drives_then_stops_and_clears_edge() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::grounded());

    rig.press(Control::Accelerate);
    rig.tick(0);
    assert_eq!(rig.engine(), [-cfg.max_engine_force; 4]);

    rig.release(Control::Accelerate);
    rig.tick(16);
    assert_eq!(rig.engine(), [0.0; 4]);
    assert_eq!(rig.input.edge(Control::Accelerate), Edge::None);

    // re-processing the cleared state changes nothing
    let before = rig.input.clone();
    rig.tick(32);
    assert_eq!(rig.engine(), [0.0; 4]);
    assert_eq!(rig.input, before);
}

#[test]
fn steer_release_zeroes_front_wheels() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::grounded());

    rig.press(Control::SteerRight);
    rig.tick(0);
    assert_eq!(rig.body.wheels[WheelId::FL.index()].steering, -cfg.max_steer_value);
    assert_eq!(rig.body.wheels[WheelId::RL.index()].steering, 0.0);

    rig.release(Control::SteerRight);
    rig.tick(16);
    assert_eq!(rig.body.wheels[WheelId::FR.index()].steering, 0.0);
    assert_eq!(rig.input.edge(Control::SteerRight), Edge::None);
}

#[test]
fn neutral_double_jump_500ms_after_jump() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::grounded());
    jump_and_release(&mut rig, 1000);

    rig.press(Control::Jump);
    rig.tick(1500);

    assert_eq!(rig.body.impulses, vec![Vector::y() * cfg.double_jump_force]);
    assert!(rig.body.torque_impulses.is_empty());
    assert!(rig.policy.timing().has_used_double_jump);
}

#[test]
fn double_jump_not_at_window_edges() {
    let cfg = VehicleConfig::ARCADE;
    for offset in [cfg.min_double_jump_ms, cfg.max_double_jump_ms] {
        let mut rig = Rig::new(RecordingBody::grounded());
        jump_and_release(&mut rig, 0);

        rig.press(Control::Jump);
        rig.tick(offset);

        assert!(rig.body.impulses.is_empty(), "fired at {offset} ms");
        assert!(!rig.policy.timing().has_used_double_jump);
    }
}

#[test]
fn double_jump_once_per_airborne_phase() {
    let mut rig = Rig::new(RecordingBody::grounded());
    jump_and_release(&mut rig, 0);

    rig.press(Control::Jump);
    rig.tick(300);
    rig.release(Control::Jump);
    rig.tick(316);
    rig.press(Control::Jump);
    rig.tick(400);
    assert_eq!(rig.body.impulses.len(), 1);

    // one wheel touching re-arms it
    rig.release(Control::Jump);
    rig.body.in_contact = 1;
    rig.tick(416);
    assert!(!rig.policy.timing().has_used_double_jump);
}

#[test]
fn side_flip_suppresses_air_control_briefly() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::grounded());
    jump_and_release(&mut rig, 0);

    rig.press(Control::SteerLeft);
    rig.press(Control::Jump);
    rig.tick(300);
    assert_eq!(rig.body.torque_impulses.len(), 1);
    assert!(rig.body.torques.is_empty());

    rig.tick(300 + cfg.flip_immobility_ms - 16);
    assert!(rig.body.torques.is_empty());

    rig.tick(300 + cfg.flip_immobility_ms);
    assert_eq!(rig.body.torques.len(), 1);
}

#[test]
fn angular_and_linear_speed_are_capped() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::airborne());
    rig.body.linvel = Vector::new(80.0, -10.0, 5.0);
    rig.body.angvel = Vector::new(20.0, 20.0, -3.0);

    rig.tick(0);

    assert!(rig.body.linvel.norm() <= cfg.max_velocity + 1e-3);
    assert!(rig.body.angvel.norm() <= cfg.max_angular_velocity + 1e-3);
    assert_relative_eq!(rig.body.linvel.normalize(), Vector::new(80.0, -10.0, 5.0).normalize(), epsilon = 1e-5);
}

#[test]
fn self_righting_impulse_now_torque_after_delay() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::upside_down());

    rig.press(Control::Jump);
    rig.tick(2000);
    assert!(rig.policy.timing().is_self_righting);
    assert_eq!(rig.body.impulses, vec![Vector::y() * cfg.self_righting_force]);
    assert!(rig.body.torque_impulses.is_empty());

    rig.tick(2000 + cfg.self_righting_delay_ms - 1);
    assert!(rig.body.torque_impulses.is_empty());

    rig.tick(2000 + cfg.self_righting_delay_ms);
    assert_eq!(rig.body.torque_impulses.len(), 1);
    assert_relative_eq!(rig.body.torque_impulses[0].norm(), cfg.self_righting_torque, epsilon = 1e-2);
    // no second ground jump or double jump out of the held key
    assert_eq!(rig.body.impulses.len(), 1);
}

#[test]
fn self_righting_clears_once_upright() {
    let mut rig = Rig::new(RecordingBody::upside_down());
    rig.press(Control::Jump);
    rig.tick(0);
    rig.release(Control::Jump);

    rig.body.angvel = Vector::new(0.0, 0.0, 4.0);
    let mut angle = 0.95 * std::f32::consts::PI;
    let mut t = 16;
    while rig.policy.timing().is_self_righting && t < 5000 {
        angle *= 0.7;
        rig.body.pose.rotation = UnitQuaternion::from_axis_angle(&Vector::z_axis(), angle);
        rig.body.pose.translation.vector.y = 1.5;
        rig.tick(t);
        t += 16;
    }

    assert!(!rig.policy.timing().is_self_righting);
    assert_eq!(rig.body.angvel, Vector::zeros());
    assert!(rig.body.torques.is_empty());
}

#[test]
fn reset_restores_spawn_and_cancels_pending_torque() {
    let mut rig = Rig::new(RecordingBody::upside_down());
    rig.press(Control::Jump);
    rig.tick(0);
    assert!(rig.policy.timing().pending_torque_at.is_some());

    rig.press(Control::Reset);
    rig.tick(16);
    assert_eq!(rig.body.resets, 1);
    assert_eq!(rig.body.pose.translation.vector, Vector::new(0.0, 1.2, 0.0));
    assert_eq!(rig.policy.timing().pending_torque_at, None);
    assert!(!rig.policy.timing().is_self_righting);

    // well past the old delay: nothing fires, and a held reset does not repeat
    rig.body.clear_log();
    rig.tick(1000);
    assert!(rig.body.torque_impulses.is_empty());
    assert_eq!(rig.body.resets, 1);
}

#[test]
fn reset_with_jump_held_does_not_jump_on_landing() {
    let mut rig = Rig::new(RecordingBody::grounded());
    rig.press(Control::Jump);
    rig.tick(0);
    assert_eq!(rig.body.impulses.len(), 1);

    rig.body.in_contact = 0;
    rig.body.pose = Isometry::translation(0.0, 3.0, 0.0);
    rig.tick(16);

    // reset while the jump key is still down
    rig.press(Control::Reset);
    rig.tick(32);
    assert_eq!(rig.body.resets, 1);
    assert!(!rig.policy.timing().latch_clear());
    rig.release(Control::Reset);

    rig.body.clear_log();
    rig.body.in_contact = 4;
    rig.tick(2000);
    rig.tick(2016);
    assert!(rig.body.impulses.is_empty());

    // release then press again: a normal jump
    rig.release(Control::Jump);
    rig.tick(2032);
    rig.press(Control::Jump);
    rig.tick(2048);
    assert_eq!(rig.body.impulses.len(), 1);
}

#[test]
fn self_righting_that_never_converges_stays_active_until_landing() {
    let cfg = VehicleConfig::ARCADE;
    let mut rig = Rig::new(RecordingBody::upside_down());
    rig.press(Control::Jump);
    rig.tick(0);
    rig.release(Control::Jump);
    assert!(rig.policy.timing().is_self_righting);

    // still on its roof long after the torque has fired
    let mut t = 16;
    while t < 10_000 {
        rig.tick(t);
        assert!(rig.policy.timing().is_self_righting, "dropped at {t} ms");
        t += 16;
    }
    assert_eq!(rig.body.torque_impulses.len(), 1);
    assert!(cfg.self_righting_delay_ms < 10_000);

    // a fresh press does not start a second attempt
    rig.press(Control::Jump);
    rig.tick(t);
    rig.release(Control::Jump);
    rig.tick(t + 16);
    assert!(rig.policy.timing().is_self_righting);
    assert_eq!(rig.body.impulses.len(), 1);
    assert_eq!(rig.body.torque_impulses.len(), 1);

    // all four wheels down clears it even though the roof never came up
    rig.body.in_contact = 4;
    rig.tick(t + 32);
    assert!(!rig.policy.timing().is_self_righting);
    assert_eq!(rig.policy.timing().pending_torque_at, None);
}

#[test]
fn reset_ends_a_stalled_self_righting() {
    let mut rig = Rig::new(RecordingBody::upside_down());
    rig.press(Control::Jump);
    rig.tick(0);
    rig.release(Control::Jump);
    for i in 1..200 {
        rig.tick(i * 16);
    }
    assert!(rig.policy.timing().is_self_righting);

    rig.press(Control::Reset);
    rig.tick(3200);
    assert!(!rig.policy.timing().is_self_righting);
    assert_eq!(rig.body.resets, 1);
}

//! Drop a car on the rapier ground slab and drive it with the real raycast
//! controller. Assertions stay loose: this checks wiring and sign
//! conventions, not tuning.

use std::time::Duration;

use arcade_drive::control::ControlPolicy;
use arcade_drive::physics::PhysicsWorld;
use arcade_drive::reset::ResetPolicy;
use arcade_drive::vehicle::VehicleHandle;
use arcade_drive::{Control, Edge, InputState, VehicleConfig};
use rapier3d::prelude::{Isometry, Real};

const DT: Real = 1.0 / 60.0;

struct Sim {
    world: PhysicsWorld,
    handle: VehicleHandle,
    policy: ControlPolicy,
    input: InputState,
    tick: u64,
}

impl Sim {
    fn new() -> Self {
        let spawn = Isometry::translation(0.0, 1.2, 0.0);
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle(VehicleConfig::ARCADE, spawn);
        Self {
            world,
            handle,
            policy: ControlPolicy::new(VehicleConfig::ARCADE, ResetPolicy::new(spawn)),
            input: InputState::new(),
            tick: 0,
        }
    }

    fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            let now = Duration::from_millis(self.tick * 1000 / 60);
            let mut body = self.world.vehicle_mut(self.handle).unwrap();
            let out = self.policy.tick(&self.input, &mut body, now);
            self.input.clear_released(&out.released);
            self.world.step(DT);
            self.tick += 1;
        }
    }

    fn position(&self) -> rapier3d::prelude::Vector<Real> {
        self.world.vehicle(self.handle).unwrap().state().pose.translation.vector
    }
}

#[test]
fn car_settles_on_its_wheels() {
    let mut sim = Sim::new();
    sim.run(120);

    let view = sim.world.vehicle(sim.handle).unwrap();
    assert!(view.wheels_in_contact() > 0);

    let y = sim.position().y;
    assert!(y > 0.2 && y < 1.5, "settled at y = {y}");
    assert!(view.frame().up.y > 0.9);
}

#[test]
fn accelerate_moves_toward_the_front() {
    let mut sim = Sim::new();
    sim.run(90);
    let start = sim.position();

    sim.input.set(Control::Accelerate, Edge::Down);
    sim.run(120);

    let moved = sim.position() - start;
    // chassis front is -z at spawn
    assert!(moved.z < -1.0, "moved {moved:?}");
}

#[test]
fn grounded_jump_leaves_the_ground() {
    let mut sim = Sim::new();
    sim.run(90);
    let rest_y = sim.position().y;

    sim.input.set(Control::Jump, Edge::Down);
    sim.run(15);

    assert!(sim.position().y > rest_y + 0.2);
}

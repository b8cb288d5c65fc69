// ==============================================================================
// sim.rs — ONE SIMULATION TICK
// ------------------------------------------------------------------------------
//   1) control policy per player (sample → decide → apply, clear consumed edges)
//   2) physics step
//   3) build vehicles for new players, drop vehicles of departed ones
//   4) cameras
//   5) tick counter + snapshot broadcast
//
// A player whose vehicle is not built yet is skipped in (1) and (4). A Ready
// slot whose body is gone is a SimError and stops the server.
// ==============================================================================

use rapier3d::prelude::Real;
use std::time::Duration;

use crate::camera::CameraState;
use crate::control::TickOutput;
use crate::error::SimError;
use crate::physics::PhysicsWorld;
use crate::state::{Player, SharedGameState};
use crate::vehicle::VehicleSlot;

#[derive(Debug)]
pub enum TickOutcome {
    Skipped,
    Evaluated(TickOutput),
}

impl Player {
    pub fn control_tick(&mut self, physics: &mut PhysicsWorld, now: Duration) -> Result<TickOutcome, SimError> {
        let VehicleSlot::Ready(handle) = self.vehicle else {
            return Ok(TickOutcome::Skipped);
        };

        let mut body = physics.vehicle_mut(handle)?;
        let out = self.policy.tick(&self.input, &mut body, now);

        self.input.clear_released(&out.released);
        self.camera.observe_modifier(self.input.modifiers().camera_switch);

        Ok(TickOutcome::Evaluated(out))
    }

    pub fn camera_tick(&mut self, physics: &PhysicsWorld) -> Result<Option<CameraState>, SimError> {
        let Some(handle) = self.vehicle.handle() else {
            return Ok(None);
        };

        let view = physics.vehicle(handle)?;
        Ok(self.camera.update(&view.state(), &view.frame(), physics.ball_position()))
    }
}

pub fn run_tick(
    game: &mut SharedGameState,
    physics: &mut PhysicsWorld,
    now: Duration,
    dt: Real,
) -> Result<(), SimError> {
    // 1) Controls
    for player in game.players.values_mut() {
        player.control_tick(physics, now)?;
    }

    // 2) Step physics
    physics.step(dt);

    // 3) Vehicle lifecycle
    for handle in game.retired_vehicles.drain(..) {
        physics.remove_vehicle(handle);
    }
    let vehicle_config = game.config.vehicle;
    for player in game.players.values_mut() {
        if player.vehicle == VehicleSlot::Uninitialized {
            let handle = physics.spawn_vehicle(vehicle_config, player.spawn.pose);
            player.vehicle = VehicleSlot::Ready(handle);
        }
    }

    // 4) Cameras
    for player in game.players.values_mut() {
        player.camera_tick(physics)?;
    }

    // 5) Advance tick + broadcast snapshot
    game.tick += 1;
    game.broadcast_snapshot(physics, now)
}

use rapier3d::prelude::{Isometry, Real};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::camera::{CameraFollowPolicy, CameraMode};
use crate::config::AppConfig;
use crate::control::ControlPolicy;
use crate::error::SimError;
use crate::input::{Control, InputState, KeyEvent};
use crate::physics::PhysicsWorld;
use crate::reset::ResetPolicy;
use crate::spawn::{PlayerSpawnInfo, SpawnManager};
use crate::timing::ManeuverPhase;
use crate::vehicle::{VehicleHandle, VehicleSlot, WheelId};

// ---------------------------------------------
// PLAYER
// ---------------------------------------------
pub struct Player {
    pub id: String,
    pub spawn: PlayerSpawnInfo,
    pub input: InputState,            // written by the connection task
    pub vehicle: VehicleSlot,         // built by the simulation loop
    pub policy: ControlPolicy,
    pub camera: CameraFollowPolicy,
}

impl Player {
    pub fn new(spawn: PlayerSpawnInfo, config: &AppConfig) -> Self {
        Self {
            id: spawn.player_id.clone(),
            input: InputState::new(),
            vehicle: VehicleSlot::Uninitialized,
            policy: ControlPolicy::new(config.vehicle, ResetPolicy::new(spawn.pose)),
            camera: CameraFollowPolicy::new(config.camera),
            spawn,
        }
    }
}

// ---------------------------------------------
// SNAPSHOT (server → client, once per tick)
// ---------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct TransformSnapshot {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // x, y, z, w
}

impl From<&Isometry<Real>> for TransformSnapshot {
    fn from(iso: &Isometry<Real>) -> Self {
        let t = iso.translation.vector;
        let q = iso.rotation.coords;
        Self { position: [t.x, t.y, t.z], rotation: [q.x, q.y, q.z, q.w] }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraSnapshot {
    pub mode: CameraMode,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub chassis: TransformSnapshot,
    pub wheels: Vec<TransformSnapshot>,
    pub wheels_in_contact: usize,
    pub phase: ManeuverPhase,
    pub camera: Option<CameraSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick: u64,
    pub players: Vec<PlayerSnapshot>,
    pub ball: Option<[f32; 3]>,
}

// ---------------------------------------------
// SHARED GAME STATE
// ---------------------------------------------
pub struct SharedGameState {
    pub tick: u64,
    pub clients: Vec<UnboundedSender<String>>,
    pub players: HashMap<String, Player>,
    pub spawns: SpawnManager,
    pub config: AppConfig,
    /// Vehicles of disconnected players, removed from physics next tick.
    pub retired_vehicles: Vec<VehicleHandle>,
}

impl SharedGameState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            tick: 0,
            clients: Vec::new(),
            players: HashMap::new(),
            spawns: SpawnManager::new(),
            config,
            retired_vehicles: Vec::new(),
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) {
        self.clients.push(tx);
    }

    /// New player with a spawn slot; its vehicle is built on the next tick.
    pub fn add_player(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        let spawn = self.spawns.allocate_spawn(&id);
        tracing::info!(player = %id, slot = spawn.slot.0, "player joined");

        let player = Player::new(spawn, &self.config);
        self.players.insert(id.clone(), player);
        id
    }

    pub fn remove_player(&mut self, player_id: &str) {
        let Some(player) = self.players.remove(player_id) else {
            return;
        };
        self.spawns.release(player.spawn.slot);
        if let Some(handle) = player.vehicle.handle() {
            self.retired_vehicles.push(handle);
        }
        tracing::info!(player = %player_id, "player left");
    }

    pub fn apply_key(&mut self, player_id: &str, event: &KeyEvent) -> Option<Control> {
        let player = self.players.get_mut(player_id)?;
        player.input.apply(event, &self.config.bindings)
    }

    pub fn toggle_camera(&mut self, player_id: &str) -> Option<CameraMode> {
        let player = self.players.get_mut(player_id)?;
        Some(player.camera.toggle())
    }

    pub fn snapshot(&self, physics: &PhysicsWorld, now: Duration) -> Result<Snapshot, SimError> {
        let mut players = Vec::with_capacity(self.players.len());

        for player in self.players.values() {
            let Some(handle) = player.vehicle.handle() else {
                continue;
            };
            let view = physics.vehicle(handle)?;
            let state = view.state();
            let in_contact = view.wheels_in_contact();

            let camera = player.camera.state().map(|c| CameraSnapshot {
                mode: player.camera.mode(),
                position: c.position.coords.into(),
                target: c.target.coords.into(),
            });

            players.push(PlayerSnapshot {
                id: player.id.clone(),
                chassis: TransformSnapshot::from(&state.pose),
                wheels: view.wheel_transforms().iter().map(TransformSnapshot::from).collect(),
                wheels_in_contact: in_contact,
                phase: player.policy.timing().phase(
                    now,
                    in_contact == WheelId::ALL.len(),
                    player.policy.config(),
                ),
                camera,
            });
        }

        Ok(Snapshot {
            kind: "snapshot",
            tick: self.tick,
            players,
            ball: physics.ball_position().map(|p| p.coords.into()),
        })
    }

    /// Send the snapshot to every client, dropping the ones that went away.
    pub fn broadcast_snapshot(&mut self, physics: &PhysicsWorld, now: Duration) -> Result<(), SimError> {
        let snapshot = self.snapshot(physics, now)?;
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(%err, "snapshot serialization failed");
                return Ok(());
            }
        };

        self.clients.retain(|tx| tx.send(json.clone()).is_ok());
        Ok(())
    }
}

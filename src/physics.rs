// src/physics.rs

use rapier3d::control::{DynamicRayCastVehicleController, WheelTuning};
use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::*;
use std::collections::HashMap;

use crate::body::{ChassisBody, ChassisState};
use crate::config::{ServerConfig, VehicleConfig};
use crate::control::governor::capped;
use crate::error::SimError;
use crate::frame::DirectionFrame;
use crate::vehicle::{VehicleHandle, WheelId};

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);
const GROUP_BALL: Group = Group::from_bits_truncate(0b0100);

/// Past this distance from the origin a body is considered blown up.
const WORLD_LIMIT: Real = 1_000.0;

/// Chassis body + its raycast suspension.
pub struct RaycastVehicle {
    pub controller: DynamicRayCastVehicleController,
    pub config: VehicleConfig,
    pub spawn: Isometry<Real>, // where the explosion guard puts it back
}

pub struct Ball {
    pub body: RigidBodyHandle,
    pub spawn: Isometry<Real>,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet, // for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for the wheel raycasts
    pub vehicles: HashMap<RigidBodyHandle, RaycastVehicle>, // chassis handle → vehicle
    pub ball: Option<Ball>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // === Static ground slab ===
        //
        // 1000 x 0.2 x 1000, centered at y = -0.1 so the top face is y = 0.
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 0.1, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS | GROUP_BALL))
            .friction(1.0)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        tracing::debug!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
            ball: None,
        }
    }

    // --------------------------------------------------
    // vehicles
    // --------------------------------------------------

    /// Box chassis + four raycast wheels (FL, FR, RL, RR, in that order).
    pub fn spawn_vehicle(&mut self, config: VehicleConfig, pose: Isometry<Real>) -> VehicleHandle {
        let [hx, hy, hz] = config.chassis_half_extents;
        let volume = 8.0 * hx * hy * hz;
        let density = config.mass / volume; // ρ = m / V

        let rb = RigidBodyBuilder::dynamic()
            .position(pose)
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(
                GROUP_CHASSIS,
                GROUP_GROUND | GROUP_CHASSIS | GROUP_BALL,
            ))
            .density(density)
            .friction(0.3)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);

        let tuning = WheelTuning {
            suspension_stiffness: config.suspension_stiffness,
            suspension_compression: config.suspension_compression,
            suspension_damping: config.suspension_damping,
            max_suspension_travel: config.max_suspension_travel,
            friction_slip: config.friction_slip,
            ..WheelTuning::default()
        };

        let mut controller = DynamicRayCastVehicleController::new(handle);
        // chassis-local: +y up, front at -z; axle -x makes the rolling
        // direction +z, so negative engine force drives toward the front
        controller.index_up_axis = 1;
        controller.index_forward_axis = 2;
        for id in WheelId::ALL {
            controller.add_wheel(
                id.mount(&config),
                -Vector::y(),
                -Vector::x(),
                config.suspension_rest_length,
                config.wheel_radius,
                &tuning,
            );
        }

        self.vehicles.insert(handle, RaycastVehicle { controller, config, spawn: pose });

        tracing::info!(?handle, x = pose.translation.x, z = pose.translation.z, "vehicle spawned");
        VehicleHandle(handle)
    }

    pub fn remove_vehicle(&mut self, handle: VehicleHandle) {
        self.vehicles.remove(&handle.0);
        self.bodies.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
        tracing::info!(handle = ?handle.0, "vehicle removed");
    }

    /// Mutable view used by the control policy.
    pub fn vehicle_mut(&mut self, handle: VehicleHandle) -> Result<VehicleBody<'_>, SimError> {
        let body = self
            .bodies
            .get_mut(handle.0)
            .ok_or(SimError::MissingChassis(handle.0))?;
        let vehicle = self
            .vehicles
            .get_mut(&handle.0)
            .ok_or(SimError::MissingController(handle.0))?;

        Ok(VehicleBody { body, controller: &mut vehicle.controller })
    }

    /// Read-only view for cameras and snapshots.
    pub fn vehicle(&self, handle: VehicleHandle) -> Result<VehicleView<'_>, SimError> {
        let body = self.bodies.get(handle.0).ok_or(SimError::MissingChassis(handle.0))?;
        let vehicle = self
            .vehicles
            .get(&handle.0)
            .ok_or(SimError::MissingController(handle.0))?;

        Ok(VehicleView { body, controller: &vehicle.controller })
    }

    // --------------------------------------------------
    // ball
    // --------------------------------------------------

    pub fn spawn_ball(&mut self, radius: Real, at: Point<Real>) -> RigidBodyHandle {
        let spawn = Isometry::translation(at.x, at.y, at.z);
        let rb = RigidBodyBuilder::dynamic()
            .position(spawn)
            .linear_damping(0.1)
            .angular_damping(0.1)
            .ccd_enabled(true)
            .build();
        let collider = ColliderBuilder::ball(radius)
            .collision_groups(InteractionGroups::new(
                GROUP_BALL,
                GROUP_GROUND | GROUP_CHASSIS,
            ))
            .density(0.2)
            .restitution(0.6)
            .build();

        let body = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, body, &mut self.bodies);
        self.ball = Some(Ball { body, spawn });

        tracing::info!(?body, radius, "ball spawned");
        body
    }

    pub fn spawn_ball_from(&mut self, server: &ServerConfig) -> RigidBodyHandle {
        let [x, y, z] = server.ball_spawn;
        self.spawn_ball(server.ball_radius, point![x, y, z])
    }

    pub fn ball_position(&self) -> Option<Point<Real>> {
        let ball = self.ball.as_ref()?;
        let body = self.bodies.get(ball.body)?;
        Some(Point::from(*body.translation()))
    }

    // --------------------------------------------------
    // stepping
    // --------------------------------------------------

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        // 1) Suspension raycasts + wheel impulses (engine / brake / steering
        //    were set by the control policy before this call).
        self.query_pipeline.update(&self.colliders);
        for (handle, vehicle) in self.vehicles.iter_mut() {
            let filter = QueryFilter::exclude_dynamic().exclude_rigid_body(*handle);
            vehicle.controller.update_vehicle(
                dt,
                &mut self.bodies,
                &self.colliders,
                &self.query_pipeline,
                filter,
            );
        }

        // 2) Step physics.
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // 3) Velocity caps again, the integrator may have overshot.
        self.govern_velocities();

        // 4) Safety: put blown-up bodies back where they started.
        self.guard_explosions();
    }

    fn govern_velocities(&mut self) {
        for (handle, vehicle) in self.vehicles.iter() {
            let Some(body) = self.bodies.get_mut(*handle) else {
                continue;
            };
            if let Some(v) = capped(body.linvel(), vehicle.config.max_velocity) {
                body.set_linvel(v, true);
            }
            if let Some(w) = capped(body.angvel(), vehicle.config.max_angular_velocity) {
                body.set_angvel(w, true);
            }
        }
    }

    fn guard_explosions(&mut self) {
        for (handle, body) in self.bodies.iter_mut() {
            let pos = *body.translation();
            let bad = !pos.x.is_finite()
                || !pos.y.is_finite()
                || !pos.z.is_finite()
                || pos.x.abs() > WORLD_LIMIT
                || pos.y.abs() > WORLD_LIMIT
                || pos.z.abs() > WORLD_LIMIT;
            if !bad {
                continue;
            }

            let home = match (self.vehicles.get(&handle), &self.ball) {
                (Some(vehicle), _) => vehicle.spawn,
                (None, Some(ball)) if ball.body == handle => ball.spawn,
                _ => Isometry::translation(0.0, 1.0, 0.0),
            };
            body.set_position(home, true);
            body.set_linvel(Vector::zeros(), true);
            body.set_angvel(Vector::zeros(), true);

            tracing::warn!(?handle, ?pos, "reset exploding body");
        }
    }
}

// ==============================================================================
// ChassisBody over a rapier body + raycast controller
// ==============================================================================

fn chassis_state(body: &RigidBody) -> ChassisState {
    ChassisState {
        pose: *body.position(),
        linvel: *body.linvel(),
        angvel: *body.angvel(),
    }
}

/// Wheel center in world space; orientation is the chassis rotation, then
/// steering about the suspension axis, then spin about the axle.
///
/// The controller only refreshes `Wheel::center()` before integration, so the
/// center is rebuilt here from the current chassis pose and the last
/// suspension length.
fn wheel_transform(
    body: &RigidBody,
    controller: &DynamicRayCastVehicleController,
    id: WheelId,
) -> Isometry<Real> {
    let pose = body.position();
    let Some(wheel) = controller.wheels().get(id.index()) else {
        return *pose;
    };

    let local = wheel.chassis_connection_point_cs
        + wheel.direction_cs * wheel.raycast_info().suspension_length;
    let center = pose * local;

    let steer = UnitQuaternion::from_axis_angle(&Vector::y_axis(), wheel.steering);
    let spin = UnitQuaternion::from_axis_angle(&Vector::x_axis(), wheel.rotation);
    let rotation = pose.rotation * steer * spin;

    Isometry::from_parts(center.coords.into(), rotation)
}

fn wheels_in_contact(controller: &DynamicRayCastVehicleController) -> usize {
    controller
        .wheels()
        .iter()
        .filter(|w| w.raycast_info().is_in_contact)
        .count()
}

pub struct VehicleView<'a> {
    body: &'a RigidBody,
    controller: &'a DynamicRayCastVehicleController,
}

impl VehicleView<'_> {
    pub fn state(&self) -> ChassisState {
        chassis_state(self.body)
    }

    pub fn wheel_transforms(&self) -> [Isometry<Real>; 4] {
        WheelId::ALL.map(|id| wheel_transform(self.body, self.controller, id))
    }

    pub fn frame(&self) -> DirectionFrame {
        let wheels = self.wheel_transforms().map(|t| Point::from(t.translation.vector));
        DirectionFrame::resolve(&wheels, &self.body.position().rotation)
    }

    pub fn wheels_in_contact(&self) -> usize {
        wheels_in_contact(self.controller)
    }
}

pub struct VehicleBody<'a> {
    body: &'a mut RigidBody,
    controller: &'a mut DynamicRayCastVehicleController,
}

impl VehicleBody<'_> {
    fn wheel_mut(&mut self, id: WheelId) -> Option<&mut rapier3d::control::Wheel> {
        self.controller.wheels_mut().get_mut(id.index())
    }
}

impl ChassisBody for VehicleBody<'_> {
    fn state(&self) -> ChassisState {
        chassis_state(self.body)
    }

    fn wheel_transform(&self, wheel: WheelId) -> Isometry<Real> {
        wheel_transform(self.body, self.controller, wheel)
    }

    fn wheels_in_contact(&self) -> usize {
        wheels_in_contact(self.controller)
    }

    fn wheel_count(&self) -> usize {
        self.controller.wheels().len()
    }

    fn apply_force(&mut self, force: Vector<Real>, at: Option<Point<Real>>) {
        match at {
            Some(point) => self.body.add_force_at_point(force, point, true),
            None => self.body.add_force(force, true),
        }
    }

    fn apply_impulse(&mut self, impulse: Vector<Real>, at: Option<Point<Real>>) {
        match at {
            Some(point) => self.body.apply_impulse_at_point(impulse, point, true),
            None => self.body.apply_impulse(impulse, true),
        }
    }

    fn apply_torque(&mut self, torque: Vector<Real>) {
        self.body.add_torque(torque, true);
    }

    fn apply_torque_impulse(&mut self, torque_impulse: Vector<Real>) {
        self.body.apply_torque_impulse(torque_impulse, true);
    }

    fn reset_forces(&mut self) {
        self.body.reset_forces(true);
    }

    fn reset_torques(&mut self) {
        self.body.reset_torques(true);
    }

    fn set_linvel(&mut self, linvel: Vector<Real>) {
        self.body.set_linvel(linvel, true);
    }

    fn set_angvel(&mut self, angvel: Vector<Real>) {
        self.body.set_angvel(angvel, true);
    }

    fn set_steering(&mut self, wheel: WheelId, value: Real) {
        if let Some(w) = self.wheel_mut(wheel) {
            w.steering = value;
        }
    }

    fn set_brake(&mut self, wheel: WheelId, value: Real) {
        if let Some(w) = self.wheel_mut(wheel) {
            w.brake = value;
        }
    }

    fn set_engine_force(&mut self, wheel: WheelId, value: Real) {
        if let Some(w) = self.wheel_mut(wheel) {
            w.engine_force = value;
        }
    }

    fn reset_to(&mut self, pose: &Isometry<Real>) {
        self.body.set_position(*pose, true);
        self.body.set_linvel(Vector::zeros(), true);
        self.body.set_angvel(Vector::zeros(), true);
        self.body.reset_forces(true);
        self.body.reset_torques(true);
        for wheel in self.controller.wheels_mut() {
            wheel.engine_force = 0.0;
            wheel.brake = 0.0;
            wheel.steering = 0.0;
        }
    }
}

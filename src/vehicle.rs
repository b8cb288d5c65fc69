use rapier3d::prelude::{Point, Real, RigidBodyHandle};

use crate::config::VehicleConfig;

// ============================================
// Wheel identification
// ============================================

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WheelId { FL, FR, RL, RR }

impl WheelId {
    /// Controller wheel order. Wheels are added to the raycast controller in
    /// this order, so `index()` is also the controller wheel index.
    pub const ALL: [WheelId; 4] = [WheelId::FL, WheelId::FR, WheelId::RL, WheelId::RR];
    pub const FRONT: [WheelId; 2] = [WheelId::FL, WheelId::FR];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_front(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::FR)
    }

    pub fn is_left(&self) -> bool {
        matches!(self, WheelId::FL | WheelId::RL)
    }

    /// Suspension mount in chassis-local space (front axle at -z, right at +x).
    pub fn mount(self, cfg: &VehicleConfig) -> Point<Real> {
        let x = if self.is_left() { -cfg.wheel_half_track } else { cfg.wheel_half_track };
        let z = if self.is_front() { -cfg.wheel_half_base } else { cfg.wheel_half_base };
        Point::new(x, cfg.wheel_mount_height, z)
    }
}

// ============================================
// Vehicle slot (per player)
// ============================================

/// Chassis body handle inside `PhysicsWorld`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VehicleHandle(pub RigidBodyHandle);

/// A player's vehicle is built by the simulation loop, not by the connection
/// task, so a player can exist for a tick or two without one.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum VehicleSlot {
    #[default]
    Uninitialized,
    Ready(VehicleHandle),
}

impl VehicleSlot {
    pub fn handle(&self) -> Option<VehicleHandle> {
        match self {
            VehicleSlot::Ready(handle) => Some(*handle),
            VehicleSlot::Uninitialized => None,
        }
    }
}

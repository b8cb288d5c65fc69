// ==============================================================================
// frame.rs — VEHICLE DIRECTION FRAME (WORLD SPACE)
// ------------------------------------------------------------------------------
// Rebuilt every tick from the four wheel world positions (FL, FR, RL, RR):
//
//     forward = normalize(mid(FL,FR) - mid(RL,RR))
//     up      = normalize(lateral × forward),  lateral = mid(FR,RR) - mid(FL,RL)
//     right   = forward × up
//
// Chassis-local convention: front axle at -z, right at +x, roof at +y. With
// that layout forward × up = right, which the torque sign conventions in
// control/ rely on:
//   +torque about right   -> nose up
//   +torque about up      -> nose left
//   +torque about forward -> roof toward right (roll right)
//
// Never cached across ticks; `from_rotation` only covers the ticks where the
// wheel positions are not available yet (before the first suspension pass).
// ==============================================================================

use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{Point, Real, Vector};

use crate::vehicle::WheelId;

const MIN_AXIS_LEN: Real = 1e-4;

#[inline]
pub fn world_up() -> Vector<Real> {
    Vector::y()
}

/// Projection onto the ground plane, normalized. `None` when `v` is (nearly)
/// vertical.
#[inline]
pub fn horizontal(v: &Vector<Real>) -> Option<Vector<Real>> {
    let flat = v - world_up() * v.dot(&world_up());
    flat.try_normalize(MIN_AXIS_LEN)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionFrame {
    pub forward: Vector<Real>,
    pub right: Vector<Real>,
    pub up: Vector<Real>,
}

impl DirectionFrame {
    pub fn from_wheels(wheels: &[Point<Real>; 4]) -> Option<Self> {
        let at = |id: WheelId| wheels[id.index()].coords;

        let front = (at(WheelId::FL) + at(WheelId::FR)) * 0.5;
        let rear = (at(WheelId::RL) + at(WheelId::RR)) * 0.5;
        let left = (at(WheelId::FL) + at(WheelId::RL)) * 0.5;
        let right = (at(WheelId::FR) + at(WheelId::RR)) * 0.5;

        let forward = (front - rear).try_normalize(MIN_AXIS_LEN)?;
        let lateral = right - left;
        let up = lateral.cross(&forward).try_normalize(MIN_AXIS_LEN)?;
        let right = forward.cross(&up);

        Some(Self { forward, right, up })
    }

    pub fn from_rotation(rot: &UnitQuaternion<Real>) -> Self {
        Self {
            forward: rot * Vector::new(0.0, 0.0, -1.0),
            right: rot * Vector::new(1.0, 0.0, 0.0),
            up: rot * Vector::new(0.0, 1.0, 0.0),
        }
    }

    /// Wheel geometry when it is usable, chassis rotation otherwise.
    pub fn resolve(wheels: &[Point<Real>; 4], rot: &UnitQuaternion<Real>) -> Self {
        Self::from_wheels(wheels).unwrap_or_else(|| Self::from_rotation(rot))
    }

    /// Cosine between the roof and world up: 1 upright, -1 on the roof.
    #[inline]
    pub fn up_alignment(&self) -> Real {
        self.up.dot(&world_up())
    }

    #[inline]
    pub fn is_inverted(&self, stuck_up_dot: Real) -> bool {
        self.up_alignment() < stuck_up_dot
    }

    #[inline]
    pub fn is_upright(&self, upright_dot: Real) -> bool {
        self.up_alignment() >= upright_dot
    }
}

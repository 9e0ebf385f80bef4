//! Math utilities and types
//!
//! Provides the small set of 3D types the scene layer needs.

pub use nalgebra::{Vector3, UnitQuaternion};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// World up axis (Y-up, right-handed)
pub fn world_up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Rotation that turns an object's local +Z axis from `from` toward `target`
///
/// Degenerate cases (coincident points, or a direction parallel to the up
/// axis) yield the identity rotation instead of NaNs.
pub fn facing_toward(from: Vec3, target: Vec3) -> Quat {
    let direction = target - from;
    if direction.norm_squared() <= f32::EPSILON {
        return Quat::identity();
    }

    let up = world_up();
    if direction.cross(&up).norm_squared() <= f32::EPSILON {
        return Quat::identity();
    }

    Quat::face_towards(&direction, &up)
}

//! Rotation helpers shared by the evaluator and the authoring tools.
//!
//! Euler angles are degrees applied Z, then X, then Y, matching the rig
//! convention of the blend-shape data.

use glam::{EulerRot, Quat, Vec3};

pub fn euler_degrees_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

/// Inverse of [`euler_degrees_to_quat`], each angle wrapped into [0, 360).
pub fn quat_to_euler_degrees(rotation: Quat) -> Vec3 {
    let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(
        wrap_degrees(x.to_degrees()),
        wrap_degrees(y.to_degrees()),
        wrap_degrees(z.to_degrees()),
    )
}

fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Slerp that returns the endpoints exactly at `t <= 0` and `t >= 1`.
#[inline]
pub fn slerp_exact(from: Quat, to: Quat, t: f32) -> Quat {
    if t >= 1.0 {
        to
    } else if t <= 0.0 {
        from
    } else {
        from.slerp(to, t)
    }
}

pub fn angle_axis_degrees(angle: f32, axis: Vec3) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, angle.to_radians())
}

pub fn to_angle_axis_degrees(rotation: Quat) -> (f32, Vec3) {
    let (axis, angle) = rotation.normalize().to_axis_angle();
    (angle.to_degrees(), axis)
}

/// Component-wise comparison that treats `q` and `-q` as the same rotation.
#[cfg(test)]
pub(crate) fn same_rotation(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
}

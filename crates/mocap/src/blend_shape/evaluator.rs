use glam::{Quat, Vec3};

use super::data::{BlendShapeData, BoneModification};
use crate::math::{euler_degrees_to_quat, slerp_exact};
use crate::rig::SceneModel;

/// Clamps to [0, 1]; NaN counts as zero.
#[inline]
pub fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) }
}

/// Adds one weighted bone delta onto the bone's current local transform.
///
/// Returns the bone that was written, or `None` when the path does not
/// resolve under `root`.
pub fn apply_bone_modification<S: SceneModel>(
    modification: &BoneModification,
    scene: &mut S,
    root: S::Bone,
    raw_weight: f32,
) -> Option<S::Bone> {
    let bone = scene.resolve_bone_path(root, &modification.bone_path)?;
    let local = scene.local_transform(bone)?;

    // The curve may overshoot; every channel saturates at the delta.
    let weight = clamp_weight(modification.curve.evaluate(clamp_weight(raw_weight)));

    let position = local.position + Vec3::ZERO.lerp(modification.translation, weight);
    let delta = slerp_exact(
        Quat::IDENTITY,
        euler_degrees_to_quat(modification.rotation),
        weight,
    );
    let rotation = delta * local.rotation;
    let scale = local.scale + Vec3::ZERO.lerp(modification.scale, weight);

    scene.set_local_position_and_rotation(bone, position, rotation);
    scene.set_local_scale(bone, scale);
    Some(bone)
}

/// Applies every modification of `shape` with the same weight and returns
/// how many of them found their bone.
pub fn apply_blend_shape<S: SceneModel>(
    shape: &BlendShapeData,
    scene: &mut S,
    root: S::Bone,
    raw_weight: f32,
) -> usize {
    let mut applied = 0;
    for modification in &shape.bone_modifications {
        match apply_bone_modification(modification, scene, root, raw_weight) {
            Some(_) => applied += 1,
            None => log::trace!(
                "Blend shape '{}': no bone at '{}'",
                shape.name,
                modification.bone_path
            ),
        }
    }
    applied
}

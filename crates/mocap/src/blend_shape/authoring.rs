use std::cmp::Ordering;

use glam::{Quat, Vec3};

use super::data::BoneModification;
use crate::config::MirrorNaming;
use crate::math::{
    angle_axis_degrees, euler_degrees_to_quat, quat_to_euler_degrees, to_angle_axis_degrees,
};
use crate::rig::{BoneTransformSnapshot, LocalTransform, PropertyEdit, SceneModel};

/// Only bones at or below the face root can carry a modification.
pub fn is_editable_bone<S: SceneModel>(scene: &S, root: S::Bone, bone: S::Bone) -> bool {
    scene.is_descendant(root, bone)
}

/// Captures the difference between two local transforms of `bone` as a
/// modification. `None` when `bone` is not below `root`.
pub fn create_bone_modification<S: SceneModel>(
    scene: &S,
    root: S::Bone,
    bone: S::Bone,
    before: &LocalTransform,
    after: &LocalTransform,
) -> Option<BoneModification> {
    let bone_path = scene.bone_path(root, bone)?;

    Some(BoneModification {
        bone_path,
        translation: after.position - before.position,
        rotation: quat_to_euler_degrees(after.rotation * before.rotation.inverse()),
        scale: after.scale - before.scale,
        curve: Default::default(),
    })
}

/// Builds a modification from per-component edits of `bone`, measured
/// against the bone's current transform. Edits to other bones are ignored.
pub fn bone_modification_from_edits<S: SceneModel>(
    scene: &S,
    root: S::Bone,
    bone: S::Bone,
    edits: &[PropertyEdit<S::Bone>],
) -> Option<BoneModification> {
    if !is_editable_bone(scene, root, bone) {
        return None;
    }

    let before = BoneTransformSnapshot::capture(scene, bone)?;
    let mut after = before;
    for edit in edits.iter().filter(|e| e.bone == bone) {
        after.set_component(edit.property, edit.axis, edit.value);
    }

    create_bone_modification(
        scene,
        root,
        bone,
        &snapshot_transform(&before),
        &snapshot_transform(&after),
    )
}

fn snapshot_transform<B>(snapshot: &BoneTransformSnapshot<B>) -> LocalTransform {
    LocalTransform {
        position: snapshot.local_position,
        rotation: snapshot.local_rotation,
        scale: snapshot.local_scale,
    }
}

/// Moves a modification to the opposite side of the face.
///
/// Side suffixes are swapped in every path segment, then the deltas are
/// taken from the old bone's parent space into model space, reflected
/// across X, and brought into the new bone's parent space. Returns false
/// and leaves `modification` untouched when either bone is missing.
pub fn mirror_bone_modification<S: SceneModel>(
    modification: &mut BoneModification,
    scene: &S,
    root: S::Bone,
    naming: &MirrorNaming,
) -> bool {
    let mirrored_path = naming.mirror_path(&modification.bone_path);

    let (Some(prev_bone), Some(curr_bone)) = (
        scene.resolve_bone_path(root, &modification.bone_path),
        scene.resolve_bone_path(root, &mirrored_path),
    ) else {
        log::warn!(
            "Cannot mirror '{}': '{}' does not resolve",
            modification.bone_path,
            mirrored_path
        );
        return false;
    };

    // The model node may be rotated; its first child usually is not.
    let model_inv = scene.model_rotation(root).inverse();
    let prev_rot = model_inv * scene.parent_world_rotation(prev_bone);
    let curr_rot_inv = (model_inv * scene.parent_world_rotation(curr_bone)).inverse();

    let reflect = |v: Vec3| -> Vec3 {
        let model_space = prev_rot * v;
        curr_rot_inv * Vec3::new(-model_space.x, model_space.y, model_space.z)
    };

    let (angle, axis) = to_angle_axis_degrees(euler_degrees_to_quat(modification.rotation));
    let rotation: Quat = angle_axis_degrees(-angle, reflect(axis));

    modification.bone_path = mirrored_path;
    modification.translation = reflect(modification.translation);
    modification.rotation = quat_to_euler_degrees(rotation);
    modification.scale = reflect(modification.scale);
    true
}

/// Stable sort by bone name (last path segment).
pub fn sort_bone_modifications(modifications: &mut [BoneModification], descending: bool) {
    modifications.sort_by(|a, b| {
        let order = compare_bone_names(a, b);
        if descending { order.reverse() } else { order }
    });
}

fn compare_bone_names(a: &BoneModification, b: &BoneModification) -> Ordering {
    a.bone_name().cmp(b.bone_name())
}

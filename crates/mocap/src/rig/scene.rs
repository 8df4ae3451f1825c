use std::fmt::Debug;
use std::hash::Hash;

use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Bone hierarchy the evaluator and actors operate on.
///
/// Paths are slash-delimited child names relative to a root bone. Writes to
/// an unknown bone are ignored.
pub trait SceneModel {
    type Bone: Copy + Eq + Hash + Debug;

    fn name(&self, bone: Self::Bone) -> Option<&str>;

    fn parent(&self, bone: Self::Bone) -> Option<Self::Bone>;

    fn find_child(&self, parent: Self::Bone, name: &str) -> Option<Self::Bone>;

    fn local_transform(&self, bone: Self::Bone) -> Option<LocalTransform>;

    /// Position and rotation are always written together so the rotation
    /// is never observed half-updated.
    fn set_local_position_and_rotation(&mut self, bone: Self::Bone, position: Vec3, rotation: Quat);

    fn set_local_scale(&mut self, bone: Self::Bone, scale: Vec3);

    fn local_position_and_rotation(&self, bone: Self::Bone) -> Option<(Vec3, Quat)> {
        self.local_transform(bone)
            .map(|local| (local.position, local.rotation))
    }

    fn local_scale(&self, bone: Self::Bone) -> Option<Vec3> {
        self.local_transform(bone).map(|local| local.scale)
    }

    fn resolve_bone_path(&self, root: Self::Bone, path: &str) -> Option<Self::Bone> {
        if path.is_empty() {
            return None;
        }

        let mut bone = root;
        for segment in path.split('/') {
            if segment.is_empty() {
                return None;
            }
            bone = self.find_child(bone, segment)?;
        }
        Some(bone)
    }

    /// Path of `bone` relative to `root`, or `None` when `bone` is not
    /// below `root`. The root itself has the empty path.
    fn bone_path(&self, root: Self::Bone, bone: Self::Bone) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = bone;

        while current != root {
            segments.push(self.name(current)?);
            current = self.parent(current)?;
        }

        segments.reverse();
        Some(segments.join("/"))
    }

    /// True when `bone` is `root` or one of its descendants.
    fn is_descendant(&self, root: Self::Bone, bone: Self::Bone) -> bool {
        let mut current = Some(bone);
        while let Some(b) = current {
            if b == root {
                return true;
            }
            current = self.parent(b);
        }
        false
    }

    fn world_rotation(&self, bone: Self::Bone) -> Quat {
        let mut rotation = Quat::IDENTITY;
        let mut current = Some(bone);
        while let Some(b) = current {
            if let Some(local) = self.local_transform(b) {
                rotation = local.rotation * rotation;
            }
            current = self.parent(b);
        }
        rotation
    }

    fn parent_world_rotation(&self, bone: Self::Bone) -> Quat {
        self.parent(bone)
            .map_or(Quat::IDENTITY, |parent| self.world_rotation(parent))
    }

    /// Local rotation of the top-most ancestor of `bone`.
    fn model_rotation(&self, bone: Self::Bone) -> Quat {
        let mut top = bone;
        while let Some(parent) = self.parent(top) {
            top = parent;
        }
        self.local_transform(top)
            .map_or(Quat::IDENTITY, |local| local.rotation)
    }
}

use glam::{Quat, Vec3};

use super::scene::{LocalTransform, SceneModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub u32);

impl BoneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct BoneNode {
    pub name: String,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub local: LocalTransform,
}

/// Arena-backed bone hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<BoneNode>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bone and returns its id. An unknown `parent` makes the bone a
    /// new top-level node.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneId>,
        local: LocalTransform,
    ) -> BoneId {
        let id = BoneId(self.bones.len() as u32);
        let parent = parent.filter(|p| p.index() < self.bones.len());

        if let Some(p) = parent {
            self.bones[p.index()].children.push(id);
        }

        self.bones.push(BoneNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            local,
        });
        id
    }

    pub fn add_root(&mut self, name: impl Into<String>) -> BoneId {
        self.add_bone(name, None, LocalTransform::default())
    }

    pub fn add_child(&mut self, parent: BoneId, name: impl Into<String>, position: Vec3) -> BoneId {
        self.add_bone(
            name,
            Some(parent),
            LocalTransform {
                position,
                ..Default::default()
            },
        )
    }

    pub fn bone(&self, id: BoneId) -> Option<&BoneNode> {
        self.bones.get(id.index())
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut BoneNode> {
        self.bones.get_mut(id.index())
    }

    /// First bone with the given name, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| BoneId(i as u32))
    }

    pub fn ids(&self) -> impl Iterator<Item = BoneId> + '_ {
        (0..self.bones.len()).map(|i| BoneId(i as u32))
    }

    /// `root` and all bones below it, depth first.
    pub fn descendants(&self, root: BoneId) -> Vec<BoneId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.bone(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

impl SceneModel for Skeleton {
    type Bone = BoneId;

    fn name(&self, bone: BoneId) -> Option<&str> {
        self.bone(bone).map(|b| b.name.as_str())
    }

    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bone(bone).and_then(|b| b.parent)
    }

    fn find_child(&self, parent: BoneId, name: &str) -> Option<BoneId> {
        self.bone(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.bones[child.index()].name == name)
    }

    fn local_transform(&self, bone: BoneId) -> Option<LocalTransform> {
        self.bone(bone).map(|b| b.local)
    }

    fn set_local_position_and_rotation(&mut self, bone: BoneId, position: Vec3, rotation: Quat) {
        if let Some(node) = self.bone_mut(bone) {
            node.local.position = position;
            node.local.rotation = rotation;
        }
    }

    fn set_local_scale(&mut self, bone: BoneId, scale: Vec3) {
        if let Some(node) = self.bone_mut(bone) {
            node.local.scale = scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::same_rotation;

    fn face() -> (Skeleton, BoneId, BoneId, BoneId) {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_root("Head");
        let eye = skeleton.add_child(root, "Eye_L", Vec3::new(0.03, 0.05, 0.08));
        let lid = skeleton.add_child(eye, "Lid_L", Vec3::new(0.0, 0.01, 0.0));
        (skeleton, root, eye, lid)
    }

    #[test]
    fn paths_resolve_relative_to_root() {
        let (skeleton, root, eye, lid) = face();

        assert_eq!(skeleton.resolve_bone_path(root, "Eye_L"), Some(eye));
        assert_eq!(skeleton.resolve_bone_path(root, "Eye_L/Lid_L"), Some(lid));
        assert_eq!(skeleton.resolve_bone_path(eye, "Lid_L"), Some(lid));
        assert_eq!(skeleton.resolve_bone_path(root, "Lid_L"), None);
        assert_eq!(skeleton.resolve_bone_path(root, ""), None);
        assert_eq!(skeleton.resolve_bone_path(root, "Eye_L//Lid_L"), None);
    }

    #[test]
    fn bone_path_inverts_resolution() {
        let (skeleton, root, eye, lid) = face();

        assert_eq!(skeleton.bone_path(root, lid).as_deref(), Some("Eye_L/Lid_L"));
        assert_eq!(skeleton.bone_path(root, root).as_deref(), Some(""));
        assert_eq!(skeleton.bone_path(lid, root), None);
        assert!(skeleton.is_descendant(root, lid));
        assert!(!skeleton.is_descendant(eye, root));
    }

    #[test]
    fn world_rotation_composes_parents() {
        let (mut skeleton, root, eye, lid) = face();
        skeleton.set_local_position_and_rotation(root, Vec3::ZERO, Quat::from_rotation_y(0.5));
        skeleton.set_local_position_and_rotation(eye, Vec3::ZERO, Quat::from_rotation_x(0.25));

        let expected = Quat::from_rotation_y(0.5) * Quat::from_rotation_x(0.25);
        assert!(same_rotation(skeleton.world_rotation(lid), expected));
        assert!(same_rotation(skeleton.parent_world_rotation(lid), expected));
        assert_eq!(skeleton.model_rotation(lid), Quat::from_rotation_y(0.5));
    }

    #[test]
    fn descendants_are_depth_first() {
        let (mut skeleton, root, eye, lid) = face();
        let jaw = skeleton.add_child(root, "Jaw", Vec3::ZERO);

        assert_eq!(skeleton.descendants(root), vec![root, eye, lid, jaw]);
        assert_eq!(skeleton.find_by_name("Jaw"), Some(jaw));
    }
}

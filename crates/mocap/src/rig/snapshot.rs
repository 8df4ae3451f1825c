use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::scene::SceneModel;

/// Local transform of one bone, captured so it can be restored later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransformSnapshot<B> {
    pub bone: B,
    pub local_position: Vec3,
    pub local_rotation: Quat,
    pub local_scale: Vec3,
}

impl<B: Copy> BoneTransformSnapshot<B> {
    pub fn capture<S>(scene: &S, bone: B) -> Option<Self>
    where
        S: SceneModel<Bone = B>,
    {
        let local = scene.local_transform(bone)?;
        Some(Self {
            bone,
            local_position: local.position,
            local_rotation: local.rotation,
            local_scale: local.scale,
        })
    }

    pub fn apply<S>(&self, scene: &mut S)
    where
        S: SceneModel<Bone = B>,
    {
        scene.set_local_position_and_rotation(self.bone, self.local_position, self.local_rotation);
        scene.set_local_scale(self.bone, self.local_scale);
    }

    pub fn set_component(&mut self, property: TransformProperty, axis: usize, value: f32) {
        match (property, axis) {
            (TransformProperty::Position, 0..=2) => self.local_position[axis] = value,
            (TransformProperty::Scale, 0..=2) => self.local_scale[axis] = value,
            (TransformProperty::Rotation, 0) => self.local_rotation.x = value,
            (TransformProperty::Rotation, 1) => self.local_rotation.y = value,
            (TransformProperty::Rotation, 2) => self.local_rotation.z = value,
            (TransformProperty::Rotation, 3) => self.local_rotation.w = value,
            _ => log::warn!("Ignoring {property:?} component {axis}"),
        }
    }

    /// Splits the snapshot into per-component edits, position then rotation
    /// (x, y, z, w) then scale.
    pub fn to_property_edits(&self) -> Vec<PropertyEdit<B>> {
        let position = self.local_position.to_array();
        let rotation = self.local_rotation.to_array();
        let scale = self.local_scale.to_array();

        let mut edits = Vec::with_capacity(10);
        for (axis, value) in position.into_iter().enumerate() {
            edits.push(PropertyEdit::new(self.bone, TransformProperty::Position, axis, value));
        }
        for (axis, value) in rotation.into_iter().enumerate() {
            edits.push(PropertyEdit::new(self.bone, TransformProperty::Rotation, axis, value));
        }
        for (axis, value) in scale.into_iter().enumerate() {
            edits.push(PropertyEdit::new(self.bone, TransformProperty::Scale, axis, value));
        }
        edits
    }
}

/// Captures every bone in order, skipping bones the scene does not know.
pub fn take_many<S, I>(scene: &S, bones: I, out: &mut Vec<BoneTransformSnapshot<S::Bone>>, clear: bool)
where
    S: SceneModel,
    I: IntoIterator<Item = S::Bone>,
{
    if clear {
        out.clear();
    }
    out.extend(
        bones
            .into_iter()
            .filter_map(|bone| BoneTransformSnapshot::capture(scene, bone)),
    );
}

pub fn apply_many<'a, S, I>(scene: &mut S, snapshots: I)
where
    S: SceneModel,
    S::Bone: 'a,
    I: IntoIterator<Item = &'a BoneTransformSnapshot<S::Bone>>,
{
    for snapshot in snapshots {
        snapshot.apply(scene);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformProperty {
    Position,
    Rotation,
    Scale,
}

/// A single scalar change to one transform component, as produced by a
/// property-based editing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyEdit<B> {
    pub bone: B,
    pub property: TransformProperty,
    pub axis: usize,
    pub value: f32,
}

impl<B> PropertyEdit<B> {
    pub fn new(bone: B, property: TransformProperty, axis: usize, value: f32) -> Self {
        Self {
            bone,
            property,
            axis,
            value,
        }
    }
}

/// Folds component edits into one snapshot per bone and applies each
/// snapshot whole. Bones are written in first-edit order.
pub fn apply_property_edits<S, I>(scene: &mut S, edits: I) -> usize
where
    S: SceneModel,
    I: IntoIterator<Item = PropertyEdit<S::Bone>>,
{
    let mut order = Vec::new();
    let mut pending: HashMap<S::Bone, BoneTransformSnapshot<S::Bone>> = HashMap::new();

    for edit in edits {
        if !pending.contains_key(&edit.bone) {
            let Some(snapshot) = BoneTransformSnapshot::capture(scene, edit.bone) else {
                continue;
            };
            pending.insert(edit.bone, snapshot);
            order.push(edit.bone);
        }
        if let Some(snapshot) = pending.get_mut(&edit.bone) {
            snapshot.set_component(edit.property, edit.axis, edit.value);
        }
    }

    for bone in &order {
        if let Some(snapshot) = pending.get(bone) {
            snapshot.apply(scene);
        }
    }
    order.len()
}

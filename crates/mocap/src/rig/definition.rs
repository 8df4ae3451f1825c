use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::scene::LocalTransform;
use super::skeleton::{BoneId, Skeleton};
use crate::blend_shape::BlendShapeData;
use crate::math::euler_degrees_to_quat;

#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("bone '{bone}' names unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },
    #[error("bone '{0}' is defined more than once")]
    DuplicateBone(String),
    #[error("rig has more than one root bone ('{0}' and '{1}')")]
    DuplicateRoot(String, String),
    #[error("rig defines no root bone")]
    MissingRoot,
    #[error("face root '{0}' is not a bone of the rig")]
    UnknownFaceRoot(String),
    #[error("invalid rig json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDefinition {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: Vec3,
    /// Euler degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl BoneDefinition {
    pub fn new(name: impl Into<String>, parent: Option<&str>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    fn local(&self) -> LocalTransform {
        LocalTransform {
            position: self.position,
            rotation: euler_degrees_to_quat(self.rotation),
            scale: self.scale,
        }
    }
}

/// Serialized character rig: bones listed parents-first, the bone blend
/// shapes are evaluated against, and the blend shapes themselves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RigDefinition {
    pub bones: Vec<BoneDefinition>,
    /// Defaults to the hierarchy root when absent.
    #[serde(default)]
    pub face_root: Option<String>,
    #[serde(default)]
    pub blend_shapes: Vec<BlendShapeData>,
}

impl RigDefinition {
    pub fn from_json(text: &str) -> Result<Self, RigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, RigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the skeleton and returns it with the face root bone.
    pub fn build(&self) -> Result<(Skeleton, BoneId), RigError> {
        let mut skeleton = Skeleton::new();
        let mut ids: HashMap<&str, BoneId> = HashMap::new();
        let mut root: Option<(&str, BoneId)> = None;

        for bone in &self.bones {
            if ids.contains_key(bone.name.as_str()) {
                return Err(RigError::DuplicateBone(bone.name.clone()));
            }

            let parent = match bone.parent.as_deref() {
                Some(parent) => Some(*ids.get(parent).ok_or_else(|| RigError::UnknownParent {
                    bone: bone.name.clone(),
                    parent: parent.to_string(),
                })?),
                None => None,
            };

            let id = skeleton.add_bone(bone.name.clone(), parent, bone.local());
            if parent.is_none() {
                if let Some((existing, _)) = root {
                    return Err(RigError::DuplicateRoot(existing.to_string(), bone.name.clone()));
                }
                root = Some((bone.name.as_str(), id));
            }
            ids.insert(bone.name.as_str(), id);
        }

        let (_, root) = root.ok_or(RigError::MissingRoot)?;
        let face_root = match self.face_root.as_deref() {
            Some(name) => *ids
                .get(name)
                .ok_or_else(|| RigError::UnknownFaceRoot(name.to_string()))?,
            None => root,
        };

        log::debug!(
            "Built rig with {} bones and {} blend shapes",
            skeleton.len(),
            self.blend_shapes.len()
        );
        Ok((skeleton, face_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::same_rotation;
    use crate::rig::SceneModel;

    #[test]
    fn builds_from_json() {
        let json = r#"{
            "bones": [
                { "name": "Root" },
                { "name": "Head", "parent": "Root", "position": [0.0, 1.6, 0.0] },
                { "name": "Jaw", "parent": "Head", "rotation": [10.0, 0.0, 0.0] }
            ],
            "face_root": "Head"
        }"#;

        let (skeleton, face_root) = RigDefinition::from_json(json).unwrap().build().unwrap();

        assert_eq!(skeleton.name(face_root), Some("Head"));
        let jaw = skeleton.resolve_bone_path(face_root, "Jaw").unwrap();
        assert_eq!(skeleton.local_scale(jaw), Some(Vec3::ONE));
        assert!(same_rotation(
            skeleton.local_transform(jaw).unwrap().rotation,
            glam::Quat::from_rotation_x(10f32.to_radians())
        ));
    }

    #[test]
    fn rejects_forward_parent_references() {
        let rig = RigDefinition {
            bones: vec![
                BoneDefinition::new("Jaw", Some("Head"), Vec3::ZERO),
                BoneDefinition::new("Head", None, Vec3::ZERO),
            ],
            ..Default::default()
        };
        assert!(matches!(rig.build(), Err(RigError::UnknownParent { .. })));
    }

    #[test]
    fn rejects_second_root() {
        let rig = RigDefinition {
            bones: vec![
                BoneDefinition::new("A", None, Vec3::ZERO),
                BoneDefinition::new("B", None, Vec3::ZERO),
            ],
            ..Default::default()
        };
        assert!(matches!(rig.build(), Err(RigError::DuplicateRoot(..))));
        assert!(matches!(
            RigDefinition::default().build(),
            Err(RigError::MissingRoot)
        ));
    }
}

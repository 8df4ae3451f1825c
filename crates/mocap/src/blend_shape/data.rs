use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::curve::ResponseCurve;

/// Per-bone delta of one blend shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneModification {
    /// Slash-delimited path relative to the face root.
    pub bone_path: String,
    #[serde(default)]
    pub translation: Vec3,
    /// Delta rotation as Euler degrees.
    #[serde(default)]
    pub rotation: Vec3,
    /// Added to the local scale, so zero means unchanged.
    #[serde(default)]
    pub scale: Vec3,
    #[serde(default)]
    pub curve: ResponseCurve,
}

impl BoneModification {
    pub fn new(bone_path: impl Into<String>) -> Self {
        Self {
            bone_path: bone_path.into(),
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ZERO,
            curve: ResponseCurve::linear(),
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, euler_degrees: Vec3) -> Self {
        self.rotation = euler_degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_curve(mut self, curve: ResponseCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Last segment of the path, i.e. the bone's own name.
    pub fn bone_name(&self) -> &str {
        self.bone_path.rsplit('/').next().unwrap_or(&self.bone_path)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendShapeData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bone_modifications: Vec<BoneModification>,
}

impl BlendShapeData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_modification(mut self, modification: BoneModification) -> Self {
        self.bone_modifications.push(modification);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{ "name": "jawOpen", "bone_modifications": [ { "bone_path": "Jaw" } ] }"#;
        let shape: BlendShapeData = serde_json::from_str(json).unwrap();

        let modification = &shape.bone_modifications[0];
        assert_eq!(shape.description, "");
        assert_eq!(modification.scale, Vec3::ZERO);
        assert_eq!(modification.curve, ResponseCurve::linear());
    }

    #[test]
    fn bone_name_is_last_segment() {
        assert_eq!(BoneModification::new("Eye_L/Lid_L").bone_name(), "Lid_L");
        assert_eq!(BoneModification::new("Jaw").bone_name(), "Jaw");
    }
}

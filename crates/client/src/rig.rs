use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;

use mocap::blend_shape::mirror_bone_modification;
use mocap::rig::BoneDefinition;
use mocap::{
    BlendShapeData, BoneModification, MirrorNaming, ResponseCurve, RigDefinition, RigError,
};

pub fn load_rig(path: Option<&Path>) -> Result<RigDefinition> {
    let Some(path) = path else {
        log::info!("No rig file given, using the demo head");
        return Ok(demo_rig()?);
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rig file {}", path.display()))?;
    let rig = RigDefinition::from_json(&text)
        .with_context(|| format!("Failed to parse rig file {}", path.display()))?;
    log::info!(
        "Loaded rig {} ({} bones, {} blend shapes)",
        path.display(),
        rig.bones.len(),
        rig.blend_shapes.len()
    );
    Ok(rig)
}

/// A small symmetric head. Right-side shapes are mirrored from the left.
pub fn demo_rig() -> Result<RigDefinition, RigError> {
    let mut rig = RigDefinition {
        bones: vec![
            BoneDefinition::new("Hips", None, Vec3::new(0.0, 1.0, 0.0)),
            BoneDefinition::new("Neck", Some("Hips"), Vec3::new(0.0, 0.5, 0.0)),
            BoneDefinition::new("Head", Some("Neck"), Vec3::new(0.0, 0.1, 0.0)),
            BoneDefinition::new("Jaw", Some("Head"), Vec3::new(0.0, -0.02, 0.03)),
            BoneDefinition::new("Eye_L", Some("Head"), Vec3::new(0.03, 0.06, 0.08)),
            BoneDefinition::new("Lid_L", Some("Eye_L"), Vec3::new(0.0, 0.01, 0.01)),
            BoneDefinition::new("Eye_R", Some("Head"), Vec3::new(-0.03, 0.06, 0.08)),
            BoneDefinition::new("Lid_R", Some("Eye_R"), Vec3::new(0.0, 0.01, 0.01)),
            BoneDefinition::new("Brow_L", Some("Head"), Vec3::new(0.03, 0.09, 0.09)),
            BoneDefinition::new("Brow_R", Some("Head"), Vec3::new(-0.03, 0.09, 0.09)),
            BoneDefinition::new("MouthCorner_L", Some("Jaw"), Vec3::new(0.025, 0.0, 0.06)),
            BoneDefinition::new("MouthCorner_R", Some("Jaw"), Vec3::new(-0.025, 0.0, 0.06)),
        ],
        face_root: Some("Head".to_string()),
        blend_shapes: vec![
            BlendShapeData::new("jawOpen")
                .with_description("Drops the jaw")
                .with_modification(
                    BoneModification::new("Jaw")
                        .with_rotation(Vec3::new(22.0, 0.0, 0.0))
                        .with_curve(ResponseCurve::ease_in_out()),
                ),
            BlendShapeData::new("browInnerUp")
                .with_modification(
                    BoneModification::new("Brow_L").with_translation(Vec3::new(-0.002, 0.006, 0.0)),
                )
                .with_modification(
                    BoneModification::new("Brow_R").with_translation(Vec3::new(0.002, 0.006, 0.0)),
                ),
        ],
    };

    let left = [
        BlendShapeData::new("eyeBlinkLeft").with_modification(
            BoneModification::new("Eye_L/Lid_L")
                .with_rotation(Vec3::new(35.0, 0.0, 0.0))
                .with_scale(Vec3::new(0.0, -0.3, 0.0)),
        ),
        BlendShapeData::new("mouthSmileLeft").with_modification(
            BoneModification::new("Jaw/MouthCorner_L")
                .with_translation(Vec3::new(0.008, 0.006, -0.004))
                .with_rotation(Vec3::new(0.0, 0.0, 10.0)),
        ),
    ];

    let (skeleton, face_root) = rig.build()?;
    let naming = MirrorNaming::default();
    for shape in left {
        let mut right = shape.clone();
        right.name = shape.name.replace("Left", "Right");
        for modification in &mut right.bone_modifications {
            if !mirror_bone_modification(modification, &skeleton, face_root, &naming) {
                log::warn!("No mirror bone for '{}'", modification.bone_path);
            }
        }
        rig.blend_shapes.push(shape);
        rig.blend_shapes.push(right);
    }

    Ok(rig)
}

#[cfg(test)]
mod tests {
    use mocap::SceneModel;

    use super::*;

    #[test]
    fn demo_rig_builds() {
        let rig = demo_rig().unwrap();
        let (skeleton, face_root) = rig.build().unwrap();
        assert_eq!(skeleton.name(face_root), Some("Head"));
        assert_eq!(rig.blend_shapes.len(), 6);
    }

    #[test]
    fn every_demo_path_resolves() {
        let rig = demo_rig().unwrap();
        let (skeleton, face_root) = rig.build().unwrap();

        for shape in &rig.blend_shapes {
            for modification in &shape.bone_modifications {
                assert!(
                    skeleton
                        .resolve_bone_path(face_root, &modification.bone_path)
                        .is_some(),
                    "{} -> {}",
                    shape.name,
                    modification.bone_path
                );
            }
        }
    }

    #[test]
    fn right_side_is_mirrored() {
        let rig = demo_rig().unwrap();
        let smile = rig
            .blend_shapes
            .iter()
            .find(|shape| shape.name == "mouthSmileRight")
            .unwrap();

        let modification = &smile.bone_modifications[0];
        assert_eq!(modification.bone_path, "Jaw/MouthCorner_R");
        assert!(modification.translation.abs_diff_eq(Vec3::new(-0.008, 0.006, -0.004), 1e-5));
    }

    #[test]
    fn rig_survives_json() {
        let rig = demo_rig().unwrap();
        let parsed = RigDefinition::from_json(&rig.to_json().unwrap()).unwrap();
        assert_eq!(parsed.bones.len(), rig.bones.len());
        assert_eq!(parsed.face_root.as_deref(), Some("Head"));
    }
}

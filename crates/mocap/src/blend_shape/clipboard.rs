//! Text interchange for copying bone modifications between blend shapes.

use serde::{Deserialize, Serialize};

use super::data::{BlendShapeData, BoneModification};

pub const CLIPBOARD_PREFIX: &str = "BoneModifications:";

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard text is not tagged as bone modifications")]
    MissingTag,
    #[error("invalid bone modification json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteMode {
    Overwrite,
    Append,
}

#[derive(Serialize)]
struct ListRef<'a> {
    bone_modifications: &'a [BoneModification],
}

#[derive(Deserialize)]
struct List {
    #[serde(default)]
    bone_modifications: Vec<BoneModification>,
}

pub fn copy_bone_modifications(modifications: &[BoneModification]) -> Result<String, ClipboardError> {
    let json = serde_json::to_string(&ListRef {
        bone_modifications: modifications,
    })?;
    Ok(format!("{CLIPBOARD_PREFIX}{json}"))
}

pub fn is_bone_modification_text(text: &str) -> bool {
    text.starts_with(CLIPBOARD_PREFIX)
}

pub fn paste_bone_modifications(text: &str) -> Result<Vec<BoneModification>, ClipboardError> {
    let json = text
        .strip_prefix(CLIPBOARD_PREFIX)
        .ok_or(ClipboardError::MissingTag)?;
    let list: List = serde_json::from_str(json)?;
    Ok(list.bone_modifications)
}

/// Parses `text` and merges it into `shape`. Nothing changes on error.
pub fn paste_into(shape: &mut BlendShapeData, text: &str, mode: PasteMode) -> Result<usize, ClipboardError> {
    let pasted = paste_bone_modifications(text)?;
    let count = pasted.len();

    match mode {
        PasteMode::Overwrite => shape.bone_modifications = pasted,
        PasteMode::Append => shape.bone_modifications.extend(pasted),
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn shape() -> BlendShapeData {
        BlendShapeData::new("browUp")
            .with_modification(BoneModification::new("Brow_L").with_translation(Vec3::Y * 0.01))
            .with_modification(BoneModification::new("Brow_R").with_rotation(Vec3::new(0.0, 0.0, 5.0)))
    }

    #[test]
    fn copied_text_is_tagged_and_pastes_back() {
        let source = shape();
        let text = copy_bone_modifications(&source.bone_modifications).unwrap();

        assert!(is_bone_modification_text(&text));
        assert_eq!(paste_bone_modifications(&text).unwrap(), source.bone_modifications);
    }

    #[test]
    fn untagged_text_is_rejected() {
        let mut target = shape();
        let result = paste_into(&mut target, r#"{"bone_modifications":[]}"#, PasteMode::Overwrite);

        assert!(matches!(result, Err(ClipboardError::MissingTag)));
        assert_eq!(target.bone_modifications.len(), 2);
    }

    #[test]
    fn broken_json_leaves_target_alone() {
        let mut target = shape();
        let result = paste_into(&mut target, "BoneModifications:{oops", PasteMode::Append);

        assert!(matches!(result, Err(ClipboardError::Json(_))));
        assert_eq!(target, shape());
    }

    #[test]
    fn paste_modes() {
        let text = copy_bone_modifications(&[BoneModification::new("Jaw")]).unwrap();

        let mut appended = shape();
        assert_eq!(paste_into(&mut appended, &text, PasteMode::Append).unwrap(), 1);
        assert_eq!(appended.bone_modifications.len(), 3);
        assert_eq!(appended.bone_modifications[2].bone_path, "Jaw");

        let mut overwritten = shape();
        paste_into(&mut overwritten, &text, PasteMode::Overwrite).unwrap();
        assert_eq!(overwritten.bone_modifications.len(), 1);
    }
}

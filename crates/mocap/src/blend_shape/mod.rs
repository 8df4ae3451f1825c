mod authoring;
mod clipboard;
mod curve;
mod data;
mod evaluator;

pub use authoring::{
    bone_modification_from_edits, create_bone_modification, is_editable_bone,
    mirror_bone_modification, sort_bone_modifications,
};
pub use clipboard::{
    CLIPBOARD_PREFIX, ClipboardError, PasteMode, copy_bone_modifications,
    is_bone_modification_text, paste_bone_modifications, paste_into,
};
pub use curve::{Keyframe, ResponseCurve};
pub use data::{BlendShapeData, BoneModification};
pub use evaluator::{apply_blend_shape, apply_bone_modification, clamp_weight};

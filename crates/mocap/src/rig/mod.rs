mod definition;
mod scene;
mod skeleton;
mod snapshot;

pub use definition::{BoneDefinition, RigDefinition, RigError};
pub use scene::{LocalTransform, SceneModel};
pub use skeleton::{BoneId, BoneNode, Skeleton};
pub use snapshot::{
    BoneTransformSnapshot, PropertyEdit, TransformProperty, apply_many, apply_property_edits,
    take_many,
};

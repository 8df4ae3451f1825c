pub mod actor;
pub mod blend_shape;
pub mod config;
pub mod math;
pub mod net;
pub mod rig;

pub use actor::{FaceActor, MotionActor, convert_head_rotation};
pub use blend_shape::{
    BlendShapeData, BoneModification, ClipboardError, Keyframe, PasteMode, ResponseCurve,
    apply_blend_shape, apply_bone_modification, mirror_bone_modification,
};
pub use config::{ActorConfig, DEFAULT_PORT, MirrorNaming, SessionConfig};
pub use net::{
    FaceData, HandlerRegistry, HeartbeatMonitor, PacketCode, PacketError, PacketHandler, Payload,
    PoseData, Session, SessionError, SessionEvent, SessionState,
};
pub use rig::{BoneId, BoneTransformSnapshot, RigDefinition, RigError, SceneModel, Skeleton};

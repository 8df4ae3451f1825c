use glam::{Quat, Vec3};
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BlendShapeWeight {
    pub name: String,
    pub value: f32,
}

/// One face-tracking sample: head orientation plus named expression weights.
///
/// `head_rotation` is `[x, y, z, w]` in the sensor's right-handed frame;
/// consumers convert it before touching bones.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct FaceData {
    pub head_rotation: [f32; 4],
    pub blend_shapes: Vec<BlendShapeWeight>,
}

impl Default for FaceData {
    fn default() -> Self {
        Self {
            head_rotation: [0.0, 0.0, 0.0, 1.0],
            blend_shapes: Vec::new(),
        }
    }
}

impl FaceData {
    pub fn new(head_rotation: Quat) -> Self {
        Self {
            head_rotation: head_rotation.to_array(),
            blend_shapes: Vec::new(),
        }
    }

    pub fn with_weight(mut self, name: impl Into<String>, value: f32) -> Self {
        self.blend_shapes.push(BlendShapeWeight {
            name: name.into(),
            value,
        });
        self
    }

    pub fn head_rotation(&self) -> Quat {
        Quat::from_array(self.head_rotation)
    }

    pub fn weight(&self, name: &str) -> Option<f32> {
        self.blend_shapes
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.value)
    }

    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PayloadError::Serialize)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let aligned = aligned_copy(bytes);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(PayloadError::Deserialize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PoseData {
    pub landmarks: Vec<Landmark>,
}

impl PoseData {
    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PayloadError::Serialize)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let aligned = aligned_copy(bytes);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(PayloadError::Deserialize)
    }
}

/// Parsed packet body, produced on the receive thread and consumed once on
/// the main thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Face(FaceData),
    Pose(PoseData),
}

// Datagram buffers carry no alignment guarantee; archives need one.
fn aligned_copy(bytes: &[u8]) -> AlignedVec {
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    aligned
}

use std::collections::HashMap;

use glam::Quat;

use crate::blend_shape::{BlendShapeData, apply_blend_shape};
use crate::config::ActorConfig;
use crate::net::{FaceData, PoseData};
use crate::rig::{BoneTransformSnapshot, SceneModel, apply_many, take_many};

/// Receiver of motion data, driven from the session tick on the main thread.
pub trait MotionActor {
    fn update_face(&mut self, data: &FaceData);

    /// Body tracking is delivered but not consumed by default.
    fn update_pose(&mut self, _data: &PoseData) {}
}

/// Converts a sensor rotation (right-handed, X left) into the rig's
/// left-handed frame. Flipping mirrors it left to right.
pub fn convert_head_rotation(rotation: Quat, flip_horizontally: bool) -> Quat {
    let mut converted = Quat::from_xyzw(rotation.x, -rotation.y, -rotation.z, rotation.w);
    if flip_horizontally {
        converted.y = -converted.y;
        converted.z = -converted.z;
    }
    converted
}

/// Plays face tracking back on a rig through bone blend shapes.
///
/// Every update starts from the bone state captured at construction, so
/// blend shapes active in the same frame add up without drifting.
pub struct FaceActor<S: SceneModel> {
    scene: S,
    face_root: S::Bone,
    config: ActorConfig,
    initial_states: Vec<BoneTransformSnapshot<S::Bone>>,
    blend_shapes: HashMap<String, BlendShapeData>,
    blend_shapes_flipped: HashMap<String, BlendShapeData>,
    last_weights: HashMap<String, f32>,
    last_head_rotation: Quat,
}

impl<S: SceneModel> FaceActor<S> {
    /// `face_bones` are the bones restored before each update.
    pub fn new(
        scene: S,
        face_root: S::Bone,
        face_bones: impl IntoIterator<Item = S::Bone>,
        blend_shapes: impl IntoIterator<Item = BlendShapeData>,
        config: ActorConfig,
    ) -> Self {
        let mut initial_states = Vec::new();
        take_many(&scene, face_bones, &mut initial_states, true);

        let mut map = HashMap::new();
        let mut flipped = HashMap::new();
        for shape in blend_shapes {
            let flipped_name = flip_side(&shape.name, &config);
            if flipped.contains_key(&flipped_name) || map.contains_key(&shape.name) {
                log::warn!("Duplicate blend shape '{}' ignored", shape.name);
                continue;
            }
            flipped.insert(flipped_name, shape.clone());
            map.insert(shape.name.clone(), shape);
        }

        log::debug!(
            "Face actor ready: {} bones, {} blend shapes",
            initial_states.len(),
            map.len()
        );

        Self {
            scene,
            face_root,
            config,
            initial_states,
            blend_shapes: map,
            blend_shapes_flipped: flipped,
            last_weights: HashMap::new(),
            last_head_rotation: Quat::IDENTITY,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn face_root(&self) -> S::Bone {
        self.face_root
    }

    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    pub fn last_weight(&self, name: &str) -> Option<f32> {
        self.last_weights.get(name).copied()
    }

    pub fn blend_shape(&self, name: &str) -> Option<&BlendShapeData> {
        self.active_map().get(name)
    }

    fn active_map(&self) -> &HashMap<String, BlendShapeData> {
        if self.config.flip_horizontally {
            &self.blend_shapes_flipped
        } else {
            &self.blend_shapes
        }
    }

    fn rotate_head(&mut self, data: &FaceData) {
        let rotation = convert_head_rotation(data.head_rotation(), self.config.flip_horizontally);
        let rotation = rotation.slerp(self.last_head_rotation, self.config.head_rotation_smooth);

        // World-space pre-multiplication, expressed in the root's parent space.
        if let Some(local) = self.scene.local_transform(self.face_root) {
            let parent = self.scene.parent_world_rotation(self.face_root);
            let local_rotation = parent.inverse() * rotation * parent * local.rotation;
            self.scene
                .set_local_position_and_rotation(self.face_root, local.position, local_rotation);
        }
        self.last_head_rotation = rotation;
    }
}

impl<S: SceneModel> MotionActor for FaceActor<S> {
    fn update_face(&mut self, data: &FaceData) {
        apply_many(&mut self.scene, &self.initial_states);
        self.rotate_head(data);

        let shapes = if self.config.flip_horizontally {
            &self.blend_shapes_flipped
        } else {
            &self.blend_shapes
        };

        for weight in &data.blend_shapes {
            let Some(shape) = shapes.get(&weight.name) else {
                continue;
            };

            let last = self.last_weights.get(&weight.name).copied().unwrap_or(0.0);
            let smoothed = lerp(weight.value, last, self.config.blend_shape_smooth);
            self.last_weights.insert(weight.name.clone(), smoothed);

            apply_blend_shape(shape, &mut self.scene, self.face_root, smoothed);
        }
    }
}

fn flip_side(name: &str, config: &ActorConfig) -> String {
    if let Some(stem) = name.strip_suffix(config.left_suffix.as_str()) {
        format!("{stem}{}", config.right_suffix)
    } else if let Some(stem) = name.strip_suffix(config.right_suffix.as_str()) {
        format!("{stem}{}", config.left_suffix)
    } else {
        name.to_string()
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

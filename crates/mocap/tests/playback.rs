use glam::{Quat, Vec3};

use mocap::{ActorConfig, FaceActor, FaceData, MotionActor, RigDefinition, SceneModel};

const RIG: &str = r#"{
    "bones": [
        { "name": "Neck" },
        { "name": "Head", "parent": "Neck", "position": [0.0, 0.1, 0.0] },
        { "name": "Jaw", "parent": "Head", "position": [0.0, -0.02, 0.03] },
        { "name": "Lid_L", "parent": "Head", "position": [0.03, 0.06, 0.08] }
    ],
    "face_root": "Head",
    "blend_shapes": [
        {
            "name": "jawOpen",
            "bone_modifications": [
                { "bone_path": "Jaw", "rotation": [20.0, 0.0, 0.0], "translation": [0.0, -0.01, 0.0] }
            ]
        },
        {
            "name": "eyeBlinkLeft",
            "bone_modifications": [
                { "bone_path": "Lid_L", "scale": [0.0, -0.5, 0.0] },
                { "bone_path": "Missing", "translation": [1.0, 0.0, 0.0] }
            ]
        }
    ]
}"#;

fn actor(config: ActorConfig) -> FaceActor<mocap::Skeleton> {
    let rig = RigDefinition::from_json(RIG).unwrap();
    let (skeleton, face_root) = rig.build().unwrap();
    let bones = skeleton.descendants(face_root);
    FaceActor::new(skeleton, face_root, bones, rig.blend_shapes, config)
}

fn unsmoothed() -> ActorConfig {
    ActorConfig {
        head_rotation_smooth: 0.0,
        blend_shape_smooth: 0.0,
        ..Default::default()
    }
}

fn same_rotation(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
}

#[test]
fn test_face_frame_drives_bones() {
    let mut actor = actor(unsmoothed());
    let root = actor.face_root();
    let jaw = actor.scene().resolve_bone_path(root, "Jaw").unwrap();
    let lid = actor.scene().resolve_bone_path(root, "Lid_L").unwrap();

    let frame = FaceData::default()
        .with_weight("jawOpen", 0.5)
        .with_weight("eyeBlinkLeft", 1.0)
        .with_weight("unknownShape", 1.0);
    actor.update_face(&frame);

    let jaw_local = actor.scene().local_transform(jaw).unwrap();
    assert!(jaw_local.position.abs_diff_eq(Vec3::new(0.0, -0.025, 0.03), 1e-5));
    assert!(same_rotation(
        jaw_local.rotation,
        Quat::from_rotation_x(10f32.to_radians())
    ));
    assert_eq!(actor.scene().local_scale(lid), Some(Vec3::new(1.0, 0.5, 1.0)));
}

#[test]
fn test_frames_do_not_accumulate() {
    let mut actor = actor(unsmoothed());
    let jaw = actor.scene().resolve_bone_path(actor.face_root(), "Jaw").unwrap();
    let frame = FaceData::default().with_weight("jawOpen", 1.0);

    actor.update_face(&frame);
    let first = actor.scene().local_transform(jaw).unwrap();
    actor.update_face(&frame);
    let second = actor.scene().local_transform(jaw).unwrap();

    assert!(first.position.abs_diff_eq(second.position, 1e-6));
    assert!(same_rotation(first.rotation, second.rotation));
}

#[test]
fn test_head_rotation_is_converted() {
    let mut actor = actor(unsmoothed());
    let sensor = Quat::from_rotation_y(30f32.to_radians());

    actor.update_face(&FaceData::new(sensor));

    let head = actor.scene().local_transform(actor.face_root()).unwrap();
    assert!(same_rotation(
        head.rotation,
        Quat::from_rotation_y(-30f32.to_radians())
    ));
}

#[test]
fn test_flipped_actor_swaps_sides() {
    let config = ActorConfig {
        flip_horizontally: true,
        ..unsmoothed()
    };
    let mut actor = actor(config);
    let lid = actor.scene().resolve_bone_path(actor.face_root(), "Lid_L").unwrap();

    // A right blink drives the left-side shape when mirrored.
    actor.update_face(&FaceData::default().with_weight("eyeBlinkRight", 1.0));

    assert_eq!(actor.scene().local_scale(lid), Some(Vec3::new(1.0, 0.5, 1.0)));
}

#[test]
fn test_weights_are_smoothed() {
    let config = ActorConfig {
        blend_shape_smooth: 0.5,
        ..unsmoothed()
    };
    let mut actor = actor(config);
    let frame = FaceData::default().with_weight("jawOpen", 1.0);

    actor.update_face(&frame);
    assert_eq!(actor.last_weight("jawOpen"), Some(0.5));
    actor.update_face(&frame);
    assert_eq!(actor.last_weight("jawOpen"), Some(0.75));
}

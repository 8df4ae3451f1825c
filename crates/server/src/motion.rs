use glam::{EulerRot, Quat};

use mocap::FaceData;

/// Head sway and expression loop used in place of camera tracking.
///
/// The rotation is in the sensor's frame, as a tracker would report it.
pub fn synthetic_face(t: f32) -> FaceData {
    let yaw = (t * 0.8).sin() * 20f32.to_radians();
    let pitch = (t * 0.5).sin() * 8f32.to_radians();
    let rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);

    let blink = blink_weight(t);

    FaceData::new(rotation)
        .with_weight("jawOpen", wave(t, 0.6))
        .with_weight("mouthSmileLeft", wave(t + 1.0, 0.25))
        .with_weight("mouthSmileRight", wave(t + 1.0, 0.25))
        .with_weight("eyeBlinkLeft", blink)
        .with_weight("eyeBlinkRight", blink)
        .with_weight("browInnerUp", wave(t + 2.0, 0.15))
}

fn wave(t: f32, frequency: f32) -> f32 {
    ((t * frequency * std::f32::consts::TAU).sin() + 1.0) * 0.5
}

// Quick close and open every four seconds.
fn blink_weight(t: f32) -> f32 {
    let phase = t.rem_euclid(4.0);
    if phase < 0.15 {
        phase / 0.15
    } else if phase < 0.3 {
        1.0 - (phase - 0.15) / 0.15
    } else {
        0.0
    }
}

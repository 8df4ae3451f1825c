use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Maps a raw blend weight to the weight actually applied.
///
/// Segments are cubic Hermite splines between keys; input outside the key
/// range takes the value of the nearest end key. A non-finite tangent turns
/// its segment into a step that holds the left key's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct ResponseCurve {
    keys: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for ResponseCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<Keyframe> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl ResponseCurve {
    pub fn new(keys: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut curve = Self { keys: Vec::new() };
        for key in keys {
            curve.add_key(key);
        }
        curve
    }

    pub fn linear() -> Self {
        Self {
            keys: vec![
                Keyframe::new(0.0, 0.0, 1.0, 1.0),
                Keyframe::new(1.0, 1.0, 1.0, 1.0),
            ],
        }
    }

    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![
                Keyframe::new(0.0, value, 0.0, 0.0),
                Keyframe::new(1.0, value, 0.0, 0.0),
            ],
        }
    }

    /// Flat tangents at both ends.
    pub fn ease_in_out() -> Self {
        Self {
            keys: vec![
                Keyframe::new(0.0, 0.0, 0.0, 0.0),
                Keyframe::new(1.0, 1.0, 0.0, 0.0),
            ],
        }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Inserts a key in time order; a key at an existing time replaces it.
    pub fn add_key(&mut self, key: Keyframe) {
        match self
            .keys
            .binary_search_by(|k| k.time.total_cmp(&key.time))
        {
            Ok(i) => self.keys[i] = key,
            Err(i) => self.keys.insert(i, key),
        }
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let upper = self.keys.partition_point(|k| k.time <= time);
        let k0 = &self.keys[upper - 1];
        let k1 = &self.keys[upper];
        hermite(k0, k1, time)
    }
}

fn hermite(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    let dt = k1.time - k0.time;
    if dt <= f32::EPSILON {
        return k0.value;
    }
    if !k0.out_tangent.is_finite() || !k1.in_tangent.is_finite() {
        return k0.value;
    }

    let s = (time - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;

    let m0 = k0.out_tangent * dt;
    let m1 = k1.in_tangent * dt;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * m0 + h01 * k1.value + h11 * m1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity_inside_unit_range() {
        let curve = ResponseCurve::linear();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn clamps_outside_key_range() {
        let curve = ResponseCurve::linear();
        assert_eq!(curve.evaluate(-2.0), 0.0);
        assert_eq!(curve.evaluate(7.0), 1.0);
    }

    #[test]
    fn nan_time_reads_first_key() {
        assert_eq!(ResponseCurve::linear().evaluate(f32::NAN), 0.0);
        assert_eq!(ResponseCurve::constant(0.7).evaluate(f32::NAN), 0.7);
    }

    #[test]
    fn degenerate_curves() {
        assert_eq!(ResponseCurve::new(Vec::new()).evaluate(0.5), 0.0);
        let single = ResponseCurve::new([Keyframe::new(0.3, 0.8, 0.0, 0.0)]);
        assert_eq!(single.evaluate(0.0), 0.8);
        assert_eq!(single.evaluate(1.0), 0.8);
        assert_eq!(ResponseCurve::constant(0.25).evaluate(0.6), 0.25);
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let curve = ResponseCurve::ease_in_out();
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!(curve.evaluate(0.1) < 0.1);
        assert!(curve.evaluate(0.9) > 0.9);
    }

    #[test]
    fn infinite_tangent_steps() {
        let curve = ResponseCurve::new([
            Keyframe::new(0.0, 0.0, 0.0, f32::INFINITY),
            Keyframe::new(1.0, 1.0, 0.0, 0.0),
        ]);
        assert_eq!(curve.evaluate(0.99), 0.0);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn deserialized_keys_are_sorted() {
        let json = r#"[
            { "time": 1.0, "value": 1.0 },
            { "time": 0.0, "value": 0.0 }
        ]"#;
        let curve: ResponseCurve = serde_json::from_str(json).unwrap();
        assert_eq!(curve.keys()[0].time, 0.0);
        assert_eq!(curve.evaluate(2.0), 1.0);
    }

    #[test]
    fn keys_stay_sorted() {
        let mut curve = ResponseCurve::new([
            Keyframe::new(1.0, 1.0, 0.0, 0.0),
            Keyframe::new(0.0, 0.0, 0.0, 0.0),
        ]);
        curve.add_key(Keyframe::new(0.5, 0.2, 0.0, 0.0));
        curve.add_key(Keyframe::new(0.5, 0.3, 0.0, 0.0));

        let times: Vec<f32> = curve.keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
        assert_eq!(curve.evaluate(0.5), 0.3);
    }
}

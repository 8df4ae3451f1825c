use std::collections::VecDeque;
use std::time::{Duration, Instant};

use mocap::{FaceActor, FaceData, MotionActor, PoseData, SceneModel, Skeleton};

const SAMPLE_COUNT: usize = 60;

/// Arrival rate of face frames over the last few samples.
pub struct FrameStats {
    arrivals: VecDeque<Instant>,
    frame_rate: f32,
    total: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            arrivals: VecDeque::with_capacity(SAMPLE_COUNT),
            frame_rate: 0.0,
            total: 0,
        }
    }

    pub fn record_frame(&mut self, now: Instant) {
        self.total += 1;

        if self.arrivals.len() >= SAMPLE_COUNT {
            self.arrivals.pop_front();
        }
        self.arrivals.push_back(now);

        if let Some(oldest) = self.arrivals.front() {
            let elapsed = now.saturating_duration_since(*oldest).as_secs_f32();
            if elapsed > 0.0 {
                self.frame_rate = (self.arrivals.len() - 1) as f32 / elapsed;
            }
        }
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Drives the rig and periodically logs what it is doing.
pub struct PlaybackActor {
    actor: FaceActor<Skeleton>,
    stats: FrameStats,
    report_interval: Duration,
    last_report: Instant,
    poses: u64,
}

impl PlaybackActor {
    pub fn new(actor: FaceActor<Skeleton>, report_interval: Duration) -> Self {
        Self {
            actor,
            stats: FrameStats::new(),
            report_interval,
            last_report: Instant::now(),
            poses: 0,
        }
    }

    fn report(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_report) < self.report_interval {
            return;
        }
        self.last_report = now;

        let head = self
            .actor
            .scene()
            .local_transform(self.actor.face_root())
            .map(|local| local.rotation.to_euler(glam::EulerRot::YXZ))
            .unwrap_or_default();
        let jaw = self.actor.last_weight("jawOpen").unwrap_or(0.0);

        log::info!(
            "{:.1} face frames/s ({} total, {} poses), head yaw {:.1} pitch {:.1}, jawOpen {:.2}",
            self.stats.frame_rate(),
            self.stats.total(),
            self.poses,
            head.0.to_degrees(),
            head.1.to_degrees(),
            jaw
        );
    }
}

impl MotionActor for PlaybackActor {
    fn update_face(&mut self, data: &FaceData) {
        let now = Instant::now();
        self.actor.update_face(data);
        self.stats.record_frame(now);
        self.report(now);
    }

    fn update_pose(&mut self, data: &PoseData) {
        self.poses += 1;
        self.actor.update_pose(data);
    }
}

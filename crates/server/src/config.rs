use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Clients without a heartbeat request for this long are dropped.
    pub heartbeat_timeout: Duration,
    pub buffer_size: usize,
    /// Synthetic face frames per second.
    pub face_rate: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout: Duration::from_secs(10),
            buffer_size: 2048,
            face_rate: 30,
        }
    }
}

impl ServerConfig {
    pub fn face_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.face_rate.max(1) as f64)
    }
}

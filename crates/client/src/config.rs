use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Session ticks per second.
    pub tick_rate: u32,
    /// How often playback statistics are logged.
    pub report_interval: Duration,
    /// Stop cleanly after this long; run until the server goes away otherwise.
    pub run_duration: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            report_interval: Duration::from_secs(1),
            run_duration: None,
        }
    }
}

impl ClientConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tick_rate_is_treated_as_one() {
        let config = ClientConfig {
            tick_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }
}

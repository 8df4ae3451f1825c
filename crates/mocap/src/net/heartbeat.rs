use std::time::{Duration, Instant};

/// Heartbeat schedule and liveness check for one session.
///
/// Nothing is considered lost until the first request went out; from then
/// on the connection is lost once `timeout` passes without a response.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
    last_sent: Option<Instant>,
    last_response: Option<Instant>,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            last_sent: None,
            last_response: None,
        }
    }

    /// True when a request is due at `now`; the caller is expected to send it.
    pub fn poll_send(&mut self, now: Instant) -> bool {
        let due = match self.last_sent {
            Some(sent) => now.saturating_duration_since(sent) >= self.interval,
            None => true,
        };

        if due {
            self.last_sent = Some(now);
            if self.last_response.is_none() {
                self.last_response = Some(now);
            }
        }
        due
    }

    pub fn record_response(&mut self, now: Instant) {
        self.last_response = Some(now);
    }

    pub fn is_lost(&self, now: Instant) -> bool {
        self.last_response
            .is_some_and(|last| now.saturating_duration_since(last) >= self.timeout)
    }

    pub fn last_response(&self) -> Option<Instant> {
        self.last_response
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn nothing_is_lost_before_first_send() {
        let monitor = HeartbeatMonitor::new(secs(2.0), secs(10.0));
        assert!(!monitor.is_lost(Instant::now() + secs(100.0)));
    }

    #[test]
    fn sends_on_interval() {
        let start = Instant::now();
        let mut monitor = HeartbeatMonitor::new(secs(2.0), secs(10.0));

        assert!(monitor.poll_send(start));
        assert!(!monitor.poll_send(start + secs(1.9)));
        assert!(monitor.poll_send(start + secs(2.0)));
        assert!(!monitor.poll_send(start + secs(3.0)));
    }

    #[test]
    fn silent_server_is_lost_at_timeout() {
        let start = Instant::now();
        let mut monitor = HeartbeatMonitor::new(secs(2.0), secs(10.0));

        let mut t = Duration::ZERO;
        while t < secs(10.0) {
            monitor.poll_send(start + t);
            assert!(!monitor.is_lost(start + t), "lost early at {t:?}");
            t += Duration::from_millis(100);
        }
        assert!(monitor.is_lost(start + secs(10.0)));
        assert!(monitor.is_lost(start + secs(12.5)));
    }

    #[test]
    fn response_resets_timeout() {
        let start = Instant::now();
        let mut monitor = HeartbeatMonitor::new(secs(2.0), secs(10.0));

        monitor.poll_send(start);
        monitor.record_response(start + secs(8.0));

        assert!(!monitor.is_lost(start + secs(17.9)));
        assert!(monitor.is_lost(start + secs(18.0)));
    }
}

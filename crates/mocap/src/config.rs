use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const MIN_BUFFER_SIZE: usize = 1024;
pub const MAX_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server_addr: SocketAddr,
    pub bind_addr: SocketAddr,
    pub buffer_size: usize,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    /// Upper bound on how long the receive thread blocks before it
    /// rechecks the stop flag.
    pub receive_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            buffer_size: 2048,
            heartbeat_interval: Duration::from_secs(2),
            heartbeat_timeout: Duration::from_secs(10),
            receive_timeout: Duration::from_millis(10),
        }
    }
}

impl SessionConfig {
    pub fn with_server(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            ..Default::default()
        }
    }

    pub fn effective_buffer_size(&self) -> usize {
        self.buffer_size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE)
    }

    pub fn effective_receive_timeout(&self) -> Duration {
        self.receive_timeout.max(Duration::from_millis(1))
    }
}

#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Weight of the previous head rotation when smoothing, in [0, 1].
    pub head_rotation_smooth: f32,
    /// Weight of the previous blend-shape weight when smoothing, in [0, 1].
    pub blend_shape_smooth: f32,
    pub flip_horizontally: bool,
    pub left_suffix: String,
    pub right_suffix: String,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            head_rotation_smooth: 0.1,
            blend_shape_smooth: 0.1,
            flip_horizontally: false,
            left_suffix: "Left".to_string(),
            right_suffix: "Right".to_string(),
        }
    }
}

/// Bone-name suffixes used when mirroring a bone modification to the
/// opposite side of the face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorNaming {
    pub left_suffix: String,
    pub right_suffix: String,
}

impl Default for MirrorNaming {
    fn default() -> Self {
        Self {
            left_suffix: "_L".to_string(),
            right_suffix: "_R".to_string(),
        }
    }
}

impl MirrorNaming {
    /// Swaps the side suffix of one path segment, if it has one.
    pub fn mirror_name(&self, name: &str) -> String {
        if let Some(stem) = name.strip_suffix(self.left_suffix.as_str()) {
            format!("{stem}{}", self.right_suffix)
        } else if let Some(stem) = name.strip_suffix(self.right_suffix.as_str()) {
            format!("{stem}{}", self.left_suffix)
        } else {
            name.to_string()
        }
    }

    pub fn mirror_path(&self, path: &str) -> String {
        path.split('/')
            .map(|segment| self.mirror_name(segment))
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size_is_clamped() {
        let mut config = SessionConfig::default();
        config.buffer_size = 64;
        assert_eq!(config.effective_buffer_size(), MIN_BUFFER_SIZE);
        config.buffer_size = 1 << 20;
        assert_eq!(config.effective_buffer_size(), MAX_BUFFER_SIZE);
    }

    #[test]
    fn mirror_swaps_every_segment() {
        let naming = MirrorNaming::default();
        assert_eq!(
            naming.mirror_path("Head/Eye_L/Lid_L"),
            "Head/Eye_R/Lid_R".to_string()
        );
        assert_eq!(naming.mirror_path("Jaw"), "Jaw".to_string());
    }

    #[test]
    fn mirror_naming_is_configurable() {
        let naming = MirrorNaming {
            left_suffix: ".l".to_string(),
            right_suffix: ".r".to_string(),
        };
        assert_eq!(naming.mirror_path("brow.r"), "brow.l".to_string());
    }
}

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::handler::{HandlerRegistry, PacketHandler, SessionContext};
use super::heartbeat::HeartbeatMonitor;
use super::packet::{self, PacketCode, PacketError};
use super::payload::{FaceData, Payload, PayloadError, PoseData};
use crate::actor::MotionActor;
use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// Outcome of one [`Session::tick`]. Every variant but `None` means the
/// session has been torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionEvent {
    #[default]
    None,
    ConnectionLost,
    ServerQuit,
    ServerDisconnected,
}

impl SessionEvent {
    pub fn is_terminal(self) -> bool {
        self != SessionEvent::None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("session is not connected")]
    NotConnected,
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// A parsed packet waiting for the main thread.
pub struct ReceivedPacket {
    pub code: PacketCode,
    pub payload: Payload,
    handler: Arc<dyn PacketHandler>,
}

#[derive(Debug, Default)]
pub struct ReceiveStats {
    datagrams: AtomicU64,
    malformed: AtomicU64,
    unhandled: AtomicU64,
    invalid_payload: AtomicU64,
    enqueued: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiveCounts {
    pub datagrams: u64,
    pub malformed: u64,
    pub unhandled: u64,
    pub invalid_payload: u64,
    pub enqueued: u64,
}

impl ReceiveStats {
    pub fn counts(&self) -> ReceiveCounts {
        ReceiveCounts {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            invalid_payload: self.invalid_payload.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Acquire),
        }
    }
}

/// Client side of one connection to a motion source.
///
/// A background thread receives and parses datagrams; handlers run on the
/// caller's thread inside [`tick`](Self::tick), in arrival order.
pub struct Session {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
    server_addr: SocketAddr,
    state: SessionState,
    running: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
    inbox: Receiver<ReceivedPacket>,
    stats: Arc<ReceiveStats>,
    heartbeat: HeartbeatMonitor,
    actors: Vec<Box<dyn MotionActor>>,
    send_buffer: Vec<u8>,
}

impl Session {
    pub fn start(
        config: &SessionConfig,
        registry: HandlerRegistry,
        actors: Vec<Box<dyn MotionActor>>,
    ) -> Result<Self, SessionError> {
        let socket = UdpSocket::bind(config.bind_addr)?;
        socket.connect(config.server_addr)?;
        socket.set_read_timeout(Some(config.effective_receive_timeout()))?;
        let local_addr = socket.local_addr()?;

        let buffer_size = config.effective_buffer_size();
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(ReceiveStats::default());
        let (tx, rx) = mpsc::channel();

        let receiver = {
            let socket = socket.try_clone()?;
            let running = Arc::clone(&running);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name("mocap-receive".to_string())
                .spawn(move || receive_loop(socket, buffer_size, registry, tx, running, stats))?
        };

        log::info!("Session started: {local_addr} -> {}", config.server_addr);

        Ok(Self {
            socket: Some(socket),
            local_addr,
            server_addr: config.server_addr,
            state: SessionState::Connected,
            running,
            receiver: Some(receiver),
            inbox: rx,
            stats,
            heartbeat: HeartbeatMonitor::new(config.heartbeat_interval, config.heartbeat_timeout),
            actors,
            send_buffer: vec![0; buffer_size],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> ReceiveCounts {
        self.stats.counts()
    }

    pub fn heartbeat(&self) -> &HeartbeatMonitor {
        &self.heartbeat
    }

    pub fn actors(&self) -> &[Box<dyn MotionActor>] {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut [Box<dyn MotionActor>] {
        &mut self.actors
    }

    /// Sends a packet with no payload.
    pub fn send(&mut self, code: PacketCode) -> Result<usize, SessionError> {
        let socket = self.socket.as_ref().ok_or(SessionError::NotConnected)?;
        let len = packet::write_empty(&mut self.send_buffer, code)?;
        Ok(socket.send(&self.send_buffer[..len])?)
    }

    pub fn send_payload(&mut self, code: PacketCode, payload: &[u8]) -> Result<usize, SessionError> {
        let socket = self.socket.as_ref().ok_or(SessionError::NotConnected)?;
        let len = packet::write(&mut self.send_buffer, code, payload)?;
        Ok(socket.send(&self.send_buffer[..len])?)
    }

    pub fn send_face(&mut self, data: &FaceData) -> Result<usize, SessionError> {
        let payload = data.encode()?;
        self.send_payload(PacketCode::FaceData, &payload)
    }

    pub fn send_pose(&mut self, data: &PoseData) -> Result<usize, SessionError> {
        let payload = data.encode()?;
        self.send_payload(PacketCode::PoseData, &payload)
    }

    pub fn tick(&mut self) -> SessionEvent {
        self.tick_at(Instant::now())
    }

    /// Drains every queued packet through its handler, then runs the
    /// heartbeat. A terminal event tears the session down before returning.
    pub fn tick_at(&mut self, now: Instant) -> SessionEvent {
        if self.state == SessionState::Disconnected {
            return SessionEvent::None;
        }

        let mut event = SessionEvent::None;
        {
            let mut context =
                SessionContext::new(now, &mut self.heartbeat, &mut self.actors, &mut event);
            while let Ok(received) = self.inbox.try_recv() {
                received
                    .handler
                    .handle(&mut context, received.code, received.payload);
            }
        }

        if !event.is_terminal() && self.heartbeat.is_lost(now) {
            log::warn!(
                "Connection lost: no heartbeat response for {:?}",
                self.heartbeat.timeout()
            );
            event = SessionEvent::ConnectionLost;
        }

        if !event.is_terminal() && self.heartbeat.poll_send(now) {
            if let Err(e) = self.send(PacketCode::HeartBeatReq) {
                log::warn!("Failed to send heartbeat: {e}");
            }
        }

        if event.is_terminal() {
            self.teardown();
        }
        event
    }

    /// Stops receiving, tells the server we are leaving, and closes the
    /// socket.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }

        self.running.store(false, Ordering::Release);
        if let Some(receiver) = self.receiver.take() {
            if receiver.join().is_err() {
                log::error!("Receive thread panicked");
            }
        }

        if let Err(e) = self.send(PacketCode::QuitNotify) {
            log::debug!("Quit notification not sent: {e}");
        }

        self.socket = None;
        self.state = SessionState::Disconnected;
        log::info!("Session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn receive_loop(
    socket: UdpSocket,
    buffer_size: usize,
    registry: HandlerRegistry,
    tx: Sender<ReceivedPacket>,
    running: Arc<AtomicBool>,
    stats: Arc<ReceiveStats>,
) {
    let mut buffer = vec![0u8; buffer_size];

    while running.load(Ordering::Acquire) {
        // Timeouts and transient errors just mean nothing arrived.
        let Ok(len) = socket.recv(&mut buffer) else {
            continue;
        };

        let Some(received) = process_datagram(&buffer[..len], &registry, &stats) else {
            continue;
        };
        if tx.send(received).is_err() {
            break;
        }
        stats.enqueued.fetch_add(1, Ordering::Release);
    }

    log::debug!("Receive loop stopped");
}

fn process_datagram(
    bytes: &[u8],
    registry: &HandlerRegistry,
    stats: &ReceiveStats,
) -> Option<ReceivedPacket> {
    stats.datagrams.fetch_add(1, Ordering::Relaxed);

    let frame = match packet::decode(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            stats.malformed.fetch_add(1, Ordering::Relaxed);
            log::warn!("Dropping malformed packet ({} bytes): {e}", bytes.len());
            return None;
        }
    };

    let Some(handler) = registry.get(frame.code) else {
        stats.unhandled.fetch_add(1, Ordering::Relaxed);
        log::warn!("No handler for {:?}; packet dropped", frame.code);
        return None;
    };

    match handler.parse_payload(frame.code, frame.payload) {
        Ok(payload) => Some(ReceivedPacket {
            code: frame.code,
            payload,
            handler: Arc::clone(handler),
        }),
        Err(e) => {
            stats.invalid_payload.fetch_add(1, Ordering::Relaxed);
            log::warn!("Bad {:?} payload: {e}", frame.code);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(code: PacketCode, payload: &[u8]) -> Vec<u8> {
        packet::encode(code, payload).unwrap()
    }

    #[test]
    fn valid_datagram_is_parsed() {
        let registry = HandlerRegistry::with_defaults();
        let stats = ReceiveStats::default();
        let face = FaceData::default().with_weight("jawOpen", 0.4);
        let bytes = frame(PacketCode::FaceData, &face.encode().unwrap());

        let received = process_datagram(&bytes, &registry, &stats).unwrap();

        assert_eq!(received.code, PacketCode::FaceData);
        assert_eq!(received.payload, Payload::Face(face));
        assert_eq!(stats.counts().datagrams, 1);
    }

    #[test]
    fn bad_datagrams_are_counted_and_dropped() {
        let registry = HandlerRegistry::with_defaults();
        let stats = ReceiveStats::default();

        let mut corrupted = frame(PacketCode::QuitNotify, &[]);
        corrupted[0] ^= 0xFF;
        assert!(process_datagram(&corrupted, &registry, &stats).is_none());
        assert!(process_datagram(&[0x2B], &registry, &stats).is_none());
        assert!(process_datagram(&frame(PacketCode::Unknown(77), &[]), &registry, &stats).is_none());
        assert!(process_datagram(&frame(PacketCode::FaceData, &[9; 3]), &registry, &stats).is_none());

        let counts = stats.counts();
        assert_eq!(counts.datagrams, 4);
        assert_eq!(counts.malformed, 2);
        assert_eq!(counts.unhandled, 1);
        assert_eq!(counts.invalid_payload, 1);
    }

    #[test]
    fn empty_payload_codes_ignore_extra_bytes() {
        let registry = HandlerRegistry::with_defaults();
        let stats = ReceiveStats::default();

        let received =
            process_datagram(&frame(PacketCode::Disconnect, b"bye"), &registry, &stats).unwrap();
        assert_eq!(received.payload, Payload::Empty);
    }

    #[test]
    fn terminal_events() {
        assert!(!SessionEvent::None.is_terminal());
        assert!(SessionEvent::ConnectionLost.is_terminal());
        assert!(SessionEvent::ServerQuit.is_terminal());
    }
}

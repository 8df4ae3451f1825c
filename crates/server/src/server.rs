use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mocap::PacketCode;
use mocap::net::packet;

use crate::config::ServerConfig;
use crate::events::{DisconnectReason, ServerEvent};
use crate::motion::synthetic_face;

#[derive(Debug, Clone, Copy)]
struct ClientState {
    last_heartbeat: Instant,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServerStats {
    pub clients: usize,
    pub frames_sent: u64,
    pub heartbeats: u64,
}

/// Single-threaded motion source: answers heartbeats and streams face data
/// to every client it has heard from.
pub struct MotionServer {
    socket: UdpSocket,
    config: ServerConfig,
    clients: HashMap<SocketAddr, ClientState>,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<ServerEvent>,
    recv_buffer: Vec<u8>,
    send_buffer: Vec<u8>,
    start_time: Instant,
    last_face_sent: Option<Instant>,
    stats: ServerStats,
}

impl MotionServer {
    pub fn new(bind_addr: &str, config: ServerConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket,
            clients: HashMap::new(),
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
            recv_buffer: vec![0; config.buffer_size],
            send_buffer: vec![0; config.buffer_size],
            start_time: Instant::now(),
            last_face_sent: None,
            stats: ServerStats::default(),
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            clients: self.clients.len(),
            ..self.stats
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();

        if let Err(e) = self.process_network(now) {
            self.pending_events.push_back(ServerEvent::Error {
                message: format!("Network error: {e}"),
            });
        }

        self.drop_silent_clients(now);

        let face_due = self
            .last_face_sent
            .is_none_or(|sent| now.duration_since(sent) >= self.config.face_interval());
        if face_due {
            self.broadcast_face(now);
            self.last_face_sent = Some(now);
        }
    }

    /// Sends `Disconnect` to every client and forgets them.
    pub fn shutdown_connections(&mut self) {
        self.broadcast_empty(PacketCode::Disconnect);

        let addrs: Vec<SocketAddr> = self.clients.drain().map(|(addr, _)| addr).collect();
        for addr in addrs {
            self.pending_events.push_back(ServerEvent::ClientDisconnected {
                addr,
                reason: DisconnectReason::Kicked,
            });
        }
    }

    fn process_network(&mut self, now: Instant) -> io::Result<()> {
        loop {
            let (len, addr) = match self.socket.recv_from(&mut self.recv_buffer) {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                // ICMP unreachable from a client that already went away.
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(e) => return Err(e),
            };

            let frame = match packet::decode(&self.recv_buffer[..len]) {
                Ok(frame) => frame,
                Err(e) => {
                    self.pending_events.push_back(ServerEvent::BadPacket {
                        addr,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let code = frame.code;
            self.handle_packet(code, addr, now)?;
        }
    }

    fn handle_packet(&mut self, code: PacketCode, addr: SocketAddr, now: Instant) -> io::Result<()> {
        if matches!(code, PacketCode::QuitNotify | PacketCode::Disconnect) {
            if self.clients.remove(&addr).is_some() {
                self.pending_events.push_back(ServerEvent::ClientDisconnected {
                    addr,
                    reason: DisconnectReason::Graceful,
                });
            }
            return Ok(());
        }

        if !self.clients.contains_key(&addr) {
            self.clients.insert(addr, ClientState { last_heartbeat: now });
            self.pending_events
                .push_back(ServerEvent::ClientConnected { addr });
        }

        match code {
            PacketCode::HeartBeatReq => {
                if let Some(client) = self.clients.get_mut(&addr) {
                    client.last_heartbeat = now;
                }
                self.stats.heartbeats += 1;
                self.send_empty(PacketCode::HeartBeatRsp, addr)?;
            }
            other => {
                self.pending_events
                    .push_back(ServerEvent::Unhandled { addr, code: other });
            }
        }
        Ok(())
    }

    fn drop_silent_clients(&mut self, now: Instant) {
        let timeout = self.config.heartbeat_timeout;
        let silent: Vec<SocketAddr> = self
            .clients
            .iter()
            .filter(|(_, client)| now.saturating_duration_since(client.last_heartbeat) >= timeout)
            .map(|(addr, _)| *addr)
            .collect();

        for addr in silent {
            self.clients.remove(&addr);
            self.pending_events.push_back(ServerEvent::ClientDisconnected {
                addr,
                reason: DisconnectReason::Timeout,
            });
        }
    }

    fn broadcast_face(&mut self, now: Instant) {
        if self.clients.is_empty() {
            return;
        }

        let t = now.duration_since(self.start_time).as_secs_f32();
        let payload = match synthetic_face(t).encode() {
            Ok(payload) => payload,
            Err(e) => {
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("Failed to encode face data: {e}"),
                });
                return;
            }
        };

        let len = match packet::write(&mut self.send_buffer, PacketCode::FaceData, &payload) {
            Ok(len) => len,
            Err(e) => {
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("Face data does not fit the send buffer: {e}"),
                });
                return;
            }
        };

        for addr in self.clients.keys() {
            if let Err(e) = self.socket.send_to(&self.send_buffer[..len], addr) {
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("Failed to send face data to {addr}: {e}"),
                });
            }
        }
        self.stats.frames_sent += 1;
    }

    fn broadcast_empty(&mut self, code: PacketCode) {
        let addrs: Vec<SocketAddr> = self.clients.keys().copied().collect();
        for addr in addrs {
            if let Err(e) = self.send_empty(code, addr) {
                log::debug!("Failed to send {code:?} to {addr}: {e}");
            }
        }
    }

    fn send_empty(&mut self, code: PacketCode, addr: SocketAddr) -> io::Result<usize> {
        let len = packet::write_empty(&mut self.send_buffer, code)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.socket.send_to(&self.send_buffer[..len], addr)
    }
}

/// Runs until the running flag clears or `duration` elapses, then
/// disconnects every client.
pub fn run(server: &mut MotionServer, duration: Option<Duration>) {
    let running = server.running();
    let started = Instant::now();

    while running.load(Ordering::SeqCst) {
        server.tick_once();
        for event in server.drain_events() {
            log_event(&event);
        }

        if duration.is_some_and(|limit| started.elapsed() >= limit) {
            log::info!("Run time elapsed");
            running.store(false, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!("Disconnecting {} clients", server.stats().clients);
    server.shutdown_connections();
    for event in server.drain_events() {
        log_event(&event);
    }
}

fn log_event(event: &ServerEvent) {
    match event {
        ServerEvent::ClientConnected { addr } => log::info!("New client {addr}"),
        ServerEvent::ClientDisconnected { addr, reason } => {
            log::info!("Client {addr} {}", reason.as_str())
        }
        ServerEvent::BadPacket { addr, reason } => log::warn!("Bad packet from {addr}: {reason}"),
        ServerEvent::Unhandled { addr, code } => log::warn!("No handler for {code:?} from {addr}"),
        ServerEvent::Error { message } => log::error!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use mocap::{FaceData, net::packet::try_read};

    use super::*;

    fn server(config: ServerConfig) -> (MotionServer, SocketAddr) {
        let server = MotionServer::new("127.0.0.1:0", config).unwrap();
        let addr = server.local_addr().unwrap();
        (server, addr)
    }

    fn client() -> UdpSocket {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        socket
    }

    fn send(socket: &UdpSocket, to: SocketAddr, code: PacketCode) {
        let bytes = packet::encode(code, &[]).unwrap();
        socket.send_to(&bytes, to).unwrap();
    }

    fn tick_until(server: &mut MotionServer, mut done: impl FnMut(&MotionServer) -> bool) {
        for _ in 0..500 {
            server.tick_once();
            if done(server) {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Receives until a frame with `code` arrives.
    fn recv_code(socket: &UdpSocket, code: PacketCode) -> Option<Vec<u8>> {
        let mut buffer = [0u8; 2048];
        for _ in 0..50 {
            let (len, _) = socket.recv_from(&mut buffer).ok()?;
            if let Some(frame) = try_read(&buffer[..len]) {
                if frame.code == code {
                    return Some(frame.payload.to_vec());
                }
            }
        }
        None
    }

    #[test]
    fn heartbeat_registers_client_and_is_answered() {
        let (mut server, addr) = server(ServerConfig::default());
        let client = client();

        send(&client, addr, PacketCode::HeartBeatReq);
        tick_until(&mut server, |s| s.client_count() == 1);

        assert_eq!(server.client_count(), 1);
        assert_eq!(server.stats().clients, 1);
        assert_eq!(server.stats().heartbeats, 1);
        assert!(recv_code(&client, PacketCode::HeartBeatRsp).is_some());
        assert!(matches!(
            server.drain_events().next(),
            Some(ServerEvent::ClientConnected { .. })
        ));
    }

    #[test]
    fn clients_receive_face_data() {
        let (mut server, addr) = server(ServerConfig::default());
        let client = client();

        send(&client, addr, PacketCode::HeartBeatReq);
        tick_until(&mut server, |s| s.stats().frames_sent > 0);

        let payload = recv_code(&client, PacketCode::FaceData).unwrap();
        let face = FaceData::decode(&payload).unwrap();
        assert!(face.weight("jawOpen").is_some());
    }

    #[test]
    fn quit_notify_removes_client() {
        let (mut server, addr) = server(ServerConfig::default());
        let client = client();

        send(&client, addr, PacketCode::HeartBeatReq);
        tick_until(&mut server, |s| s.client_count() == 1);
        send(&client, addr, PacketCode::QuitNotify);
        tick_until(&mut server, |s| s.client_count() == 0);

        assert_eq!(server.client_count(), 0);
    }

    #[test]
    fn silent_clients_are_dropped() {
        let config = ServerConfig {
            heartbeat_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let (mut server, addr) = server(config);
        let client = client();

        send(&client, addr, PacketCode::HeartBeatReq);
        tick_until(&mut server, |s| s.client_count() == 1);
        thread::sleep(Duration::from_millis(30));
        server.tick_once();

        assert_eq!(server.client_count(), 0);
        assert!(server.drain_events().any(|e| matches!(
            e,
            ServerEvent::ClientDisconnected {
                reason: DisconnectReason::Timeout,
                ..
            }
        )));
    }

    #[test]
    fn shutdown_disconnects_everyone() {
        let (mut server, addr) = server(ServerConfig::default());
        let client = client();

        send(&client, addr, PacketCode::HeartBeatReq);
        tick_until(&mut server, |s| s.client_count() == 1);
        server.shutdown_connections();

        assert_eq!(server.client_count(), 0);
        assert!(recv_code(&client, PacketCode::Disconnect).is_some());
    }
}

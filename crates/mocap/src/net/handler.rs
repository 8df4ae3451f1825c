use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::heartbeat::HeartbeatMonitor;
use super::packet::PacketCode;
use super::payload::{Payload, PayloadError};
use super::session::SessionEvent;
use crate::actor::MotionActor;

/// Main-thread state a handler may touch while the queue is drained.
pub struct SessionContext<'a> {
    pub now: Instant,
    pub heartbeat: &'a mut HeartbeatMonitor,
    pub actors: &'a mut [Box<dyn MotionActor>],
    event: &'a mut SessionEvent,
}

impl<'a> SessionContext<'a> {
    pub fn new(
        now: Instant,
        heartbeat: &'a mut HeartbeatMonitor,
        actors: &'a mut [Box<dyn MotionActor>],
        event: &'a mut SessionEvent,
    ) -> Self {
        Self {
            now,
            heartbeat,
            actors,
            event,
        }
    }

    /// Ends the session after the current drain. The first request wins.
    pub fn request_shutdown(&mut self, event: SessionEvent) {
        if !self.event.is_terminal() {
            *self.event = event;
        }
    }

    pub fn pending_event(&self) -> SessionEvent {
        *self.event
    }
}

/// Parses and acts on one packet code.
///
/// `parse_payload` runs on the receive thread, `handle` on the main thread
/// during [`Session::tick`](super::Session::tick).
pub trait PacketHandler: Send + Sync {
    fn parse_payload(&self, code: PacketCode, payload: &[u8]) -> Result<Payload, PayloadError>;

    fn handle(&self, context: &mut SessionContext<'_>, code: PacketCode, payload: Payload);
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a handler for {0:?} is already registered")]
    Duplicate(PacketCode),
}

/// Code to handler table, built once before the session starts.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<PacketCode, Arc<dyn PacketHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `code`. A second registration for the same
    /// code is reported and discarded.
    pub fn register(
        &mut self,
        code: PacketCode,
        handler: Arc<dyn PacketHandler>,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&code) {
            log::error!("Duplicate handler for {code:?}; keeping the first one");
            return Err(RegistryError::Duplicate(code));
        }
        self.handlers.insert(code, handler);
        Ok(())
    }

    /// Builds a registry from an explicit table. Duplicates are logged and
    /// skipped.
    pub fn from_table<I>(table: I) -> Self
    where
        I: IntoIterator<Item = (PacketCode, Arc<dyn PacketHandler>)>,
    {
        let mut registry = Self::new();
        for (code, handler) in table {
            let _ = registry.register(code, handler);
        }
        registry
    }

    /// Handlers for every code the client understands.
    pub fn with_defaults() -> Self {
        Self::from_table(super::handlers::default_table())
    }

    pub fn get(&self, code: PacketCode) -> Option<&Arc<dyn PacketHandler>> {
        self.handlers.get(&code)
    }

    pub fn contains(&self, code: PacketCode) -> bool {
        self.handlers.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

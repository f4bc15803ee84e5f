use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use crate::models::{ConnectionId, SendMessage};

#[derive(Debug, Default)]
struct Presence {
    room_id: Option<String>,
    closed: bool,
}

#[derive(Debug)]
struct Connection {
    sender: UnboundedSender<SendMessage>,
    presence: Mutex<Presence>,
}

/// Outbound queue of every open socket, plus which room each one is in.
///
/// The table itself is only written by register and unregister. Room membership lives
/// in a per-connection lock, so joins in different rooms share the table read lock.
/// Room fan-out goes through the member queues held by each `Room`, not through here.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a connection id and the queue its socket writer drains.
    pub fn register(&self) -> (ConnectionId, UnboundedReceiver<SendMessage>) {
        let id = ConnectionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Connection { sender, presence: Mutex::default() };
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), connection);
        debug!("Registered connection {}", id);
        (id, receiver)
    }

    /// Drops the connection's outbound queue. Safe to call more than once.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        let removed = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            debug!("Unregistered connection {}", id);
        }
        removed
    }

    pub fn send(&self, id: &ConnectionId, message: SendMessage) -> bool {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        match connections.get(id) {
            Some(conn) => {
                if conn.sender.send(message).is_err() {
                    warn!("Outbound queue closed for connection {}", id);
                    return false;
                }
                true
            }
            None => false,
        }
    }

    /// Associates the connection with `room_id` and hands back its outbound queue.
    ///
    /// Returns `None` once the connection is closed or unknown; the caller must not add
    /// it to the room in that case.
    pub fn attach(&self, id: &ConnectionId, room_id: &str) -> Option<UnboundedSender<SendMessage>> {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        let conn = connections.get(id)?;
        let mut presence = conn.presence.lock().unwrap_or_else(PoisonError::into_inner);
        if presence.closed {
            return None;
        }
        presence.room_id = Some(room_id.to_string());
        Some(conn.sender.clone())
    }

    /// Clears the association while the connection stays open.
    pub fn detach(&self, id: &ConnectionId) -> Option<String> {
        self.with_presence(id, |presence| presence.room_id.take())
    }

    /// Marks the connection closed and takes its room. Later attaches fail, and only the
    /// first call returns the room.
    pub fn close(&self, id: &ConnectionId) -> Option<String> {
        self.with_presence(id, |presence| {
            presence.closed = true;
            presence.room_id.take()
        })
    }

    pub fn room_of(&self, id: &ConnectionId) -> Option<String> {
        self.with_presence(id, |presence| presence.room_id.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn with_presence<R>(
        &self,
        id: &ConnectionId,
        f: impl FnOnce(&mut Presence) -> Option<R>,
    ) -> Option<R> {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        let conn = connections.get(id)?;
        let mut presence = conn.presence.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut presence)
    }
}

//! Room membership store
//!
//! Thread-safe, in-memory store mapping connection ids to their outbound
//! channels and room names to member sets. Membership lives only as long as
//! the connection; a room exists only while at least one member is joined.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// Connection identity, valid for the lifetime of one socket
pub type ConnId = u64;

/// Outbound half of a connection; the socket task drains this into the sink
pub type OutboundTx = mpsc::UnboundedSender<Message>;

/// Room relay store
#[derive(Default)]
pub struct RoomStore {
    next_id: AtomicU64,
    connections: DashMap<ConnId, OutboundTx>,
    rooms: DashMap<String, HashSet<ConnId>>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and hand back its id.
    pub fn connect(&self, tx: OutboundTx) -> ConnId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, tx);
        debug!("chat: connected {}, count={}", id, self.connections.len());
        id
    }

    /// Drop a connection and prune it from every room it joined.
    /// Rooms left empty disappear with it.
    pub fn disconnect(&self, id: ConnId) {
        self.connections.remove(&id);
        self.rooms.retain(|_, members| {
            members.remove(&id);
            !members.is_empty()
        });
        debug!("chat: disconnected {}, count={}", id, self.connections.len());
    }

    /// Join a room. No-op for blank room names or unknown connections;
    /// joining twice has the same membership effect as joining once.
    pub fn join(&self, id: ConnId, room: &str) {
        if room.trim().is_empty() || !self.connections.contains_key(&id) {
            return;
        }
        self.rooms.entry(room.to_string()).or_default().insert(id);
        debug!("chat: {} joined room '{}'", id, room);
    }

    /// Broadcast to every member of the room, sender included.
    /// Fire-and-forget: closed receivers are skipped, not errors.
    pub fn broadcast(&self, room: &str, msg: &Message) {
        self.send_to_members(room, None, msg);
    }

    /// Broadcast to every member of the room except `sender`.
    pub fn broadcast_from(&self, room: &str, sender: ConnId, msg: &Message) {
        self.send_to_members(room, Some(sender), msg);
    }

    fn send_to_members(&self, room: &str, exclude: Option<ConnId>, msg: &Message) {
        let Some(members) = self.rooms.get(room) else {
            return;
        };
        for member in members.iter() {
            if Some(*member) == exclude {
                continue;
            }
            if let Some(tx) = self.connections.get(member) {
                let _ = tx.send(msg.clone());
            }
        }
    }

    /// Current member count of a room (0 if it does not exist)
    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Current connection count
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn text(s: &str) -> Message {
        Message::Text(s.to_string())
    }

    fn connect(store: &RoomStore) -> (ConnId, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (store.connect(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_broadcast_includes_sender() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        store.join(a, "R1");
        store.join(b, "R1");

        store.broadcast("R1", &text("hello"));

        assert_eq!(drain(&mut rx_a), vec![text("hello")]);
        assert_eq!(drain(&mut rx_b), vec![text("hello")]);
    }

    #[test]
    fn test_typing_excludes_sender() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        store.join(a, "R1");
        store.join(b, "R1");

        store.broadcast_from("R1", a, &text("typing"));

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![text("typing")]);
    }

    #[test]
    fn test_join_is_idempotent() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        store.join(a, "R1");
        store.join(a, "R1");

        assert_eq!(store.room_size("R1"), 1);
        store.broadcast("R1", &text("once"));
        // One membership, one delivery
        assert_eq!(drain(&mut rx_a).len(), 1);
    }

    #[test]
    fn test_blank_room_is_noop() {
        let store = RoomStore::new();
        let (a, _rx) = connect(&store);
        store.join(a, "");
        store.join(a, "   ");
        assert_eq!(store.room_size(""), 0);
    }

    #[test]
    fn test_rooms_are_isolated() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        store.join(a, "R1");
        store.join(b, "R2");

        store.broadcast("R1", &text("only r1"));

        assert_eq!(drain(&mut rx_a).len(), 1);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[test]
    fn test_disconnect_prunes_all_rooms() {
        let store = RoomStore::new();
        let (a, _rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        store.join(a, "R1");
        store.join(a, "R2");
        store.join(b, "R1");

        store.disconnect(a);

        assert_eq!(store.room_size("R1"), 1);
        // R2 is empty and gone
        assert_eq!(store.room_size("R2"), 0);
        assert_eq!(store.connection_count(), 1);

        store.broadcast("R1", &text("still here"));
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[test]
    fn test_broadcast_to_unknown_room_is_noop() {
        let store = RoomStore::new();
        let (_a, mut rx_a) = connect(&store);
        store.broadcast("nowhere", &text("lost"));
        assert!(drain(&mut rx_a).is_empty());
    }
}

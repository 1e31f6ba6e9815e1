//! Real-time chat relay
//!
//! Clients connect over WebSocket, join named rooms, and exchange chat and
//! typing events. Nothing is persisted: delivery is fire-and-forget,
//! at-most-once per currently-connected member, and clients must rejoin
//! their rooms after reconnecting.
//!
//! Inbound events (JSON text frames):
//! - `{"type": "join", "room": "R1"}`
//! - `{"type": "send", "room": "R1", "msg": ...}`
//! - `{"type": "typing", "room": "R1", "user": ..., "isTyping": true}`
//!
//! Outbound events:
//! - `chat-add-msg` to every room member, sender included
//! - `chat-user-typing` to every room member except the sender
//!
//! Malformed events are dropped silently; no error ever reaches the sender.

mod store;

pub use store::{ConnId, OutboundTx, RoomStore};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Inbound chat event. Unknown types fail deserialization and are dropped.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ChatEvent {
    Join {
        #[serde(default)]
        room: String,
    },
    Send {
        #[serde(default)]
        room: String,
        #[serde(default)]
        msg: Value,
    },
    Typing {
        #[serde(default)]
        room: String,
        #[serde(default)]
        user: Value,
        #[serde(rename = "isTyping", default)]
        is_typing: bool,
    },
}

/// Handle WebSocket upgrade for a chat connection
pub async fn handle_chat_upgrade(
    store: Arc<RoomStore>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Response<Full<Bytes>> {
    let (response, websocket) = match hyper_tungstenite::upgrade(req, None) {
        Ok(upgrade) => upgrade,
        Err(e) => {
            warn!("chat: WebSocket upgrade failed: {}", e);
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(format!(
                    r#"{{"error": "WebSocket upgrade failed: {e}"}}"#
                ))))
                .unwrap();
        }
    };

    tokio::spawn(async move {
        match websocket.await {
            Ok(ws) => handle_chat_connection(store, ws).await,
            Err(e) => warn!("chat: WebSocket connection failed: {}", e),
        }
    });

    response.map(|_| Full::new(Bytes::new()))
}

/// Run an established chat connection until the peer goes away
async fn handle_chat_connection(
    store: Arc<RoomStore>,
    ws: hyper_tungstenite::WebSocketStream<hyper_util::rt::TokioIo<hyper::upgrade::Upgraded>>,
) {
    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let conn = store.connect(tx.clone());
    info!("chat: new connection {}", conn);

    // Writer task drains the outbound channel into the socket
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = read.next().await {
        match msg {
            Message::Text(text) => {
                // Malformed events are dropped, never bounced back
                let Ok(event) = serde_json::from_str::<ChatEvent>(&text) else {
                    debug!("chat: dropping malformed event from {}", conn);
                    continue;
                };
                apply_event(&store, conn, event);
            }
            Message::Ping(data) => {
                let _ = tx.send(Message::Pong(data));
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    store.disconnect(conn);
    drop(tx);
    let _ = writer.await;
    info!("chat: disconnected {}", conn);
}

/// Apply one inbound event against the store. Events with falsy required
/// fields are no-ops.
fn apply_event(store: &RoomStore, conn: ConnId, event: ChatEvent) {
    match event {
        ChatEvent::Join { room } => {
            store.join(conn, &room);
        }
        ChatEvent::Send { room, msg } => {
            if room.trim().is_empty() || is_falsy(&msg) {
                return;
            }
            let out = Message::Text(
                json!({ "type": "chat-add-msg", "room": room, "msg": msg }).to_string(),
            );
            store.broadcast(&room, &out);
        }
        ChatEvent::Typing { room, user, is_typing } => {
            if room.trim().is_empty() {
                return;
            }
            let out = Message::Text(
                json!({
                    "type": "chat-user-typing",
                    "room": room,
                    "user": user,
                    "isTyping": is_typing,
                })
                .to_string(),
            );
            store.broadcast_from(&room, conn, &out);
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn connect(store: &RoomStore) -> (ConnId, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (store.connect(tx), rx)
    }

    fn recv_json(rx: &mut UnboundedReceiver<Message>) -> Option<Value> {
        match rx.try_recv().ok()? {
            Message::Text(text) => serde_json::from_str(&text).ok(),
            _ => None,
        }
    }

    fn event(raw: &str) -> ChatEvent {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_send_fans_out_to_room_including_sender() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        apply_event(&store, a, event(r#"{"type":"join","room":"R1"}"#));
        apply_event(&store, b, event(r#"{"type":"join","room":"R1"}"#));

        apply_event(
            &store,
            a,
            event(r#"{"type":"send","room":"R1","msg":{"txt":"hello"}}"#),
        );

        for rx in [&mut rx_a, &mut rx_b] {
            let out = recv_json(rx).expect("member should receive the message");
            assert_eq!(out["type"], "chat-add-msg");
            assert_eq!(out["room"], "R1");
            assert_eq!(out["msg"]["txt"], "hello");
        }
    }

    #[test]
    fn test_typing_reaches_only_other_members() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        apply_event(&store, a, event(r#"{"type":"join","room":"R1"}"#));
        apply_event(&store, b, event(r#"{"type":"join","room":"R1"}"#));

        apply_event(
            &store,
            a,
            event(r#"{"type":"typing","room":"R1","user":{"fullname":"Puki"},"isTyping":true}"#),
        );

        assert!(recv_json(&mut rx_a).is_none());
        let out = recv_json(&mut rx_b).unwrap();
        assert_eq!(out["type"], "chat-user-typing");
        assert_eq!(out["isTyping"], true);
    }

    #[test]
    fn test_double_join_delivers_once() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        apply_event(&store, a, event(r#"{"type":"join","room":"R1"}"#));
        apply_event(&store, a, event(r#"{"type":"join","room":"R1"}"#));

        apply_event(&store, a, event(r#"{"type":"send","room":"R1","msg":"hi"}"#));

        assert!(recv_json(&mut rx_a).is_some());
        assert!(recv_json(&mut rx_a).is_none());
    }

    #[test]
    fn test_falsy_fields_are_dropped() {
        let store = RoomStore::new();
        let (a, mut rx_a) = connect(&store);
        apply_event(&store, a, event(r#"{"type":"join","room":"R1"}"#));

        // Missing room, empty room, missing/empty msg: all silent no-ops
        apply_event(&store, a, event(r#"{"type":"send","msg":"hi"}"#));
        apply_event(&store, a, event(r#"{"type":"send","room":"","msg":"hi"}"#));
        apply_event(&store, a, event(r#"{"type":"send","room":"R1"}"#));
        apply_event(&store, a, event(r#"{"type":"send","room":"R1","msg":""}"#));
        apply_event(&store, a, event(r#"{"type":"typing","user":"x"}"#));
        apply_event(&store, a, event(r#"{"type":"join","room":""}"#));

        assert!(recv_json(&mut rx_a).is_none());
    }

    #[tokio::test]
    async fn test_delivery_through_outbound_channel() {
        let store = RoomStore::new();
        let (a, _rx_a) = connect(&store);
        let (b, mut rx_b) = connect(&store);
        apply_event(&store, a, event(r#"{"type":"join","room":"R1"}"#));
        apply_event(&store, b, event(r#"{"type":"join","room":"R1"}"#));

        apply_event(
            &store,
            a,
            event(r#"{"type":"send","room":"R1","msg":{"txt":"hello"}}"#),
        );

        // Awaiting the receiver is how the per-connection writer task drains
        let Some(Message::Text(text)) = rx_b.recv().await else {
            panic!("expected a text frame");
        };
        let out: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(out["type"], "chat-add-msg");
        assert_eq!(out["msg"]["txt"], "hello");
    }

    #[test]
    fn test_unknown_event_type_fails_parse() {
        assert!(serde_json::from_str::<ChatEvent>(r#"{"type":"nuke","room":"R1"}"#).is_err());
        assert!(serde_json::from_str::<ChatEvent>("not json").is_err());
    }
}

// ── Chatmark: WebSocket Control Channel ────────────────────────────────────
// Persistent request/reply channel for out-of-band control messages.
//
// Envelopes flow both directions as `{type, target, payload, markId, isReply,
// id}`. For each inbound envelope with `isReply == false` the loop dispatches
// on `(type, target, payload.command)`; on a match it sends one reply with
// `isReply = true` and the same `id`/`markId` for correlation. Unmatched
// envelopes get no reply — callers apply their own timeout. A malformed
// envelope closes the connection with a reason string.
//
// Envelopes are processed one at a time per connection, in arrival order.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::store::Conversation;

use super::AppState;

// ── Envelope ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_id: Option<String>,
    pub is_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Envelope {
    /// Reply carrying `payload`, correlated by the request's `id`/`markId`.
    fn reply(&self, payload: Value) -> Envelope {
        Envelope {
            kind: self.kind.clone(),
            target: self.target.clone(),
            payload,
            mark_id: self.mark_id.clone(),
            is_reply: true,
            id: self.id.clone(),
        }
    }
}

// ── Handler ────────────────────────────────────────────────────────────────

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection_loop(socket, state))
}

async fn connection_loop(mut socket: WebSocket, state: AppState) {
    info!("[ws] connection open");

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("[ws] receive error: {e}");
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let envelope: Envelope = match serde_json::from_str(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("[ws] malformed envelope: {e}");
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "malformed envelope".into(),
                            })))
                            .await;
                        break;
                    }
                };

                if envelope.is_reply {
                    continue;
                }

                if let Some(reply) = dispatch(&state, &envelope) {
                    let Ok(raw) = serde_json::to_string(&reply) else { continue };
                    if socket.send(Message::Text(raw)).await.is_err() {
                        // Peer went away; pending reply is simply dropped.
                        break;
                    }
                }
            }
            Message::Ping(data) => {
                let _ = socket.send(Message::Pong(data)).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!("[ws] connection closed");
}

// ── Dispatch ───────────────────────────────────────────────────────────────

/// Match `(type, target, payload.command)` and produce a reply, or `None` for
/// envelopes this backend does not understand.
fn dispatch(state: &AppState, envelope: &Envelope) -> Option<Envelope> {
    let command = envelope.payload.get("command").and_then(Value::as_str)?;

    match (envelope.kind.as_str(), envelope.target.as_str(), command) {
        ("page", "ChatPage", "Get-MarkId") => Some(envelope.reply(allocate_mark(state))),
        _ => {
            debug!(
                "[ws] ignoring envelope type={} target={} command={}",
                envelope.kind, envelope.target, command
            );
            None
        }
    }
}

/// Allocate a fresh mark and register it as an empty conversation so a later
/// page fetch for it is well-defined.
fn allocate_mark(state: &AppState) -> Value {
    let mark = Uuid::new_v4().to_string();
    let conversation = Conversation {
        title: "New Chat".into(),
        update_date: Utc::now().fixed_offset(),
        model: "gpt4".into(),
        root: None,
    };
    match state.store.add_conversation(&mark, conversation) {
        Ok(()) => {
            info!("[ws] allocated mark '{mark}'");
            json!({ "success": true, "value": mark })
        }
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::store::MessageStore;

    fn state() -> AppState {
        AppState::new(ServerConfig::default(), MessageStore::new(), json!({}))
    }

    fn envelope(kind: &str, target: &str, command: &str) -> Envelope {
        Envelope {
            kind: kind.into(),
            target: target.into(),
            payload: json!({ "command": command }),
            mark_id: Some("mark1".into()),
            is_reply: false,
            id: Some("req-7".into()),
        }
    }

    #[test]
    fn get_mark_id_replies_with_correlation() {
        let state = state();
        let request = envelope("page", "ChatPage", "Get-MarkId");
        let reply = dispatch(&state, &request).expect("reply");

        assert!(reply.is_reply);
        assert_eq!(reply.id.as_deref(), Some("req-7"));
        assert_eq!(reply.mark_id.as_deref(), Some("mark1"));
        assert_eq!(reply.payload["success"], json!(true));

        // The allocated mark is registered as an empty conversation.
        let mark = reply.payload["value"].as_str().unwrap();
        assert!(state.store.conversation(mark).unwrap().root.is_none());
    }

    #[test]
    fn unmatched_envelopes_get_no_reply() {
        let state = state();
        assert!(dispatch(&state, &envelope("page", "ChatPage", "Do-Nothing")).is_none());
        assert!(dispatch(&state, &envelope("page", "OtherPage", "Get-MarkId")).is_none());
        assert!(dispatch(&state, &envelope("toast", "ChatPage", "Get-MarkId")).is_none());
    }

    #[test]
    fn envelope_without_command_is_ignored() {
        let state = state();
        let mut request = envelope("page", "ChatPage", "Get-MarkId");
        request.payload = json!({});
        assert!(dispatch(&state, &request).is_none());
    }

    #[test]
    fn envelope_wire_names_are_camel_case() {
        let reply = envelope("page", "ChatPage", "Get-MarkId").reply(json!({"success": true}));
        let raw = serde_json::to_value(&reply).unwrap();
        assert_eq!(raw["type"], json!("page"));
        assert_eq!(raw["isReply"], json!(true));
        assert_eq!(raw["markId"], json!("mark1"));
    }
}

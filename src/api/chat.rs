// ── Chatmark: Chat Routes ──────────────────────────────────────────────────
// History paging, the append mutation, and the static chat catalogs.
// Heavy logic lives in crate::page / crate::store; these functions extract
// parameters, call in, and wrap the envelope.

use axum::extract::{Form, Query, State};
use axum::Json;
use log::{debug, info};
use serde::Deserialize;

use crate::error::{ChatError, ChatResult};
use crate::fixtures;
use crate::page;
use crate::response::ApiResponse;
use crate::store::{MessageRecord, Position};

use super::AppState;

// ── GET /chat/messages ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    #[serde(default)]
    pub mark_id: Option<String>,
    #[serde(default)]
    pub prev_id: Option<String>,
    #[serde(default)]
    pub next_id: Option<String>,
}

pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> ChatResult<Json<ApiResponse>> {
    let mark_id = query
        .mark_id
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ChatError::malformed("missing markId"))?;

    debug!(
        "[chat] fetch_page markId={} prevId={:?} nextId={:?}",
        mark_id, query.prev_id, query.next_id
    );

    let result = page::fetch_page(
        &state.store,
        mark_id,
        query.prev_id.as_deref().filter(|p| !p.is_empty()),
        query.next_id.as_deref().filter(|n| !n.is_empty()),
    )?;
    Ok(Json(ApiResponse::ok(result)))
}

// ── PUT /chat/messages ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePut {
    #[serde(default)]
    pub mark_id: Option<String>,
    #[serde(default)]
    pub msg_id: Option<String>,
    #[serde(default)]
    pub next_message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Append a new record `nextMessage` after `msgId`. 409 when `msgId` already
/// links forward, 404 when the mark or `msgId` is unknown.
pub async fn put_messages(
    State(state): State<AppState>,
    Form(form): Form<MessagePut>,
) -> ChatResult<Json<ApiResponse>> {
    let mark_id = require(form.mark_id.as_deref(), "markId")?;
    let msg_id = require(form.msg_id.as_deref(), "msgId")?;
    let next_id = require(form.next_message.as_deref(), "nextMessage")?;

    // The mark must resolve even though records are keyed globally —
    // appending into an unknown conversation is a caller bug.
    state.store.conversation(mark_id)?;

    let record = MessageRecord::new(
        form.position.unwrap_or(Position::Left),
        form.name.as_deref().unwrap_or("AI Assistant"),
        form.avatar.as_deref().unwrap_or("/src/assets/AI.png"),
        form.content.as_deref().unwrap_or(""),
    );
    state.store.append(msg_id, next_id, record)?;

    info!("[chat] appended '{next_id}' after '{msg_id}' in mark '{mark_id}'");
    Ok(Json(ApiResponse::ok_empty()))
}

fn require<'a>(value: Option<&'a str>, field: &str) -> ChatResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ChatError::malformed(format!("missing {field}")))
}

// ── Static catalogs ────────────────────────────────────────────────────────

pub async fn get_models() -> Json<ApiResponse> {
    Json(ApiResponse::ok(fixtures::model_catalog()))
}

pub async fn get_history(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(ApiResponse::ok(state.store.conversation_summaries()))
}

pub async fn get_chatbox(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(ApiResponse::ok(state.chatbox.as_ref().clone()))
}

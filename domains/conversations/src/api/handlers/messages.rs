//! Message API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{ConversationId, Message, MessageId, MessageRole};

/// Request for appending a finalized message
#[derive(Debug, Deserialize, Validate)]
pub struct AddMessageRequest {
    /// Defaults to `user`
    #[serde(default = "default_role")]
    pub role: MessageRole,

    #[validate(length(min = 1))]
    pub content: String,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageResponse {
    pub fn new(conversation_id: ConversationId, m: &Message) -> Self {
        Self {
            id: m.id,
            conversation_id,
            role: m.role,
            content: m.content.clone(),
            created_at: m.created_at,
        }
    }
}

/// Append a message to a conversation without contacting the model
pub async fn add_message(
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<ConversationId>,
    ValidatedJson(req): ValidatedJson<AddMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let mut store = state.store.write().await;
    let id = store.next_message_id();
    let message = Message::new(id, req.role, req.content)?;
    let stored = store.add_message(conversation_id, message)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(conversation_id, stored)),
    ))
}

/// List messages in a conversation, oldest first
pub async fn list_messages(
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<Vec<MessageResponse>>> {
    let store = state.store.read().await;
    let messages = store
        .messages(conversation_id)?
        .iter()
        .map(|m| MessageResponse::new(conversation_id, m))
        .collect();

    Ok(Json(messages))
}

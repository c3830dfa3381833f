//! Conversation management API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley_common::{Error, Pagination, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::handlers::messages::MessageResponse;
use crate::api::middleware::ConversationsState;
use crate::domain::entities::{Conversation, ConversationId, DEFAULT_TITLE};

/// Request for creating a conversation
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateConversationRequest {
    /// Optional conversation title, "New Chat" when omitted
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
}

/// Request for renaming a conversation
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConversationRequest {
    #[validate(length(max = 200))]
    pub title: String,
}

/// Request for changing the current conversation
#[derive(Debug, Deserialize, Validate)]
pub struct SetCurrentConversationRequest {
    /// `null` clears the selection
    pub conversation_id: Option<ConversationId>,
}

/// Conversation summary DTO used by the list endpoint
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub message_count: usize,
    pub is_current: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSummary {
    fn new(c: &Conversation, current: Option<ConversationId>) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            message_count: c.message_count(),
            is_current: current == Some(c.id),
            last_message_at: c.last_message_at(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Conversation response DTO with its messages
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<MessageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationResponse {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            messages: c
                .messages
                .iter()
                .map(|m| MessageResponse::new(c.id, m))
                .collect(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Current selection DTO
#[derive(Debug, Serialize)]
pub struct CurrentConversationResponse {
    pub conversation_id: Option<ConversationId>,
    pub conversation: Option<ConversationResponse>,
}

/// Create a new conversation; it becomes the current one
pub async fn create_conversation(
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationResponse>)> {
    let title = req.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let mut store = state.store.write().await;
    let id = store.next_conversation_id();
    let created = store.add_conversation(Conversation::new(id, title)?)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List conversations in insertion order
pub async fn list_conversations(
    State(state): State<ConversationsState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ConversationSummary>>> {
    let store = state.store.read().await;
    let current = store.current_conversation_id();

    let summaries = pagination.apply(
        store
            .conversations()
            .iter()
            .map(|c| ConversationSummary::new(c, current)),
    );
    Ok(Json(summaries))
}

/// Get a single conversation by ID
pub async fn get_conversation(
    State(state): State<ConversationsState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<ConversationResponse>> {
    let store = state.store.read().await;
    let conversation = store
        .find(id)
        .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

    Ok(Json(conversation.into()))
}

/// Rename a conversation
pub async fn update_conversation(
    State(state): State<ConversationsState>,
    Path(id): Path<ConversationId>,
    ValidatedJson(req): ValidatedJson<UpdateConversationRequest>,
) -> Result<Json<ConversationResponse>> {
    let mut store = state.store.write().await;
    let updated = store.update_conversation_title(id, req.title)?;

    Ok(Json(updated.into()))
}

/// Delete a conversation
pub async fn delete_conversation(
    State(state): State<ConversationsState>,
    Path(id): Path<ConversationId>,
) -> Result<StatusCode> {
    state.store.write().await.delete_conversation(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the current conversation, if any
pub async fn get_current_conversation(
    State(state): State<ConversationsState>,
) -> Result<Json<CurrentConversationResponse>> {
    let store = state.store.read().await;

    Ok(Json(CurrentConversationResponse {
        conversation_id: store.current_conversation_id(),
        conversation: store.current_conversation().map(Into::into),
    }))
}

/// Select a conversation or clear the selection
pub async fn set_current_conversation(
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<SetCurrentConversationRequest>,
) -> Result<Json<CurrentConversationResponse>> {
    let mut store = state.store.write().await;
    store.set_current_conversation(req.conversation_id)?;

    Ok(Json(CurrentConversationResponse {
        conversation_id: store.current_conversation_id(),
        conversation: store.current_conversation().map(Into::into),
    }))
}

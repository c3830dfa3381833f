//! Prompt preset API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::PromptsState;
use crate::domain::entities::{Prompt, PromptId};

/// Request for creating a prompt preset
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromptRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1))]
    pub content: String,
}

/// Request for toggling a preset
#[derive(Debug, Deserialize, Validate)]
pub struct SetPromptActiveRequest {
    pub active: bool,
}

/// Prompt response DTO
#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub id: PromptId,
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Prompt> for PromptResponse {
    fn from(p: &Prompt) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            content: p.content.clone(),
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

/// Create a new, inactive preset
pub async fn create_prompt(
    State(state): State<PromptsState>,
    ValidatedJson(req): ValidatedJson<CreatePromptRequest>,
) -> Result<(StatusCode, Json<PromptResponse>)> {
    let mut store = state.store.write().await;
    let created = store.create_prompt(req.name, req.content)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List all presets
pub async fn list_prompts(State(state): State<PromptsState>) -> Result<Json<Vec<PromptResponse>>> {
    let store = state.store.read().await;
    Ok(Json(store.prompts().iter().map(Into::into).collect()))
}

/// Get the active preset, `null` when none is active
pub async fn get_active_prompt(
    State(state): State<PromptsState>,
) -> Result<Json<Option<PromptResponse>>> {
    let store = state.store.read().await;
    Ok(Json(store.active_prompt().map(Into::into)))
}

/// Delete a preset
pub async fn delete_prompt(
    State(state): State<PromptsState>,
    Path(id): Path<PromptId>,
) -> Result<StatusCode> {
    state.store.write().await.delete_prompt(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Activate or deactivate a preset
pub async fn set_prompt_active(
    State(state): State<PromptsState>,
    Path(id): Path<PromptId>,
    ValidatedJson(req): ValidatedJson<SetPromptActiveRequest>,
) -> Result<Json<PromptResponse>> {
    let mut store = state.store.write().await;
    let updated = store.set_prompt_active(id, req.active)?;

    Ok(Json(updated.into()))
}

//! Route definitions for Prompts domain API

use axum::{
    routing::{delete, get, put},
    Router,
};

use super::handlers::prompts;
use super::middleware::PromptsState;

/// Create all Prompts domain API routes
pub fn routes() -> Router<PromptsState> {
    Router::new()
        .route(
            "/v1/prompts",
            get(prompts::list_prompts).post(prompts::create_prompt),
        )
        .route("/v1/prompts/active", get(prompts::get_active_prompt))
        .route("/v1/prompts/{id}", delete(prompts::delete_prompt))
        .route("/v1/prompts/{id}/active", put(prompts::set_prompt_active))
}

//! Parley application composition root
//!
//! Composes all domain routers into a single application.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderValue, Method},
    Router,
};
use parley_chat::{ChatSession, ChatState};
use parley_conversations::{ConversationStore, ConversationsState};
use parley_llm::{LlmConfig, LlmService, LlmServiceFactory};
use parley_prompts::{PromptStore, PromptsState};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Maximum accepted request body size
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router, building the LLM service from config
pub fn create_app(llm_config: LlmConfig) -> Result<Router, anyhow::Error> {
    let llm = LlmServiceFactory::create(llm_config)?;
    Ok(create_app_with_llm(Arc::from(llm)))
}

/// Create the main application router around an existing LLM service
pub fn create_app_with_llm(llm: Arc<dyn LlmService>) -> Router {
    let session = ChatSession::new(
        ConversationStore::new().into_shared(),
        PromptStore::new().into_shared(),
        llm,
    );
    let chat_state = ChatState::new(session);

    // Domain states share the stores owned by the chat session
    let conversations_state = ConversationsState::from_ref(&chat_state);
    let prompts_state = PromptsState::from_ref(&chat_state);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Parley API v0.0.1-SNAPSHOT" }),
        )
        .merge(parley_conversations::routes().with_state(conversations_state))
        .merge(parley_prompts::routes().with_state(prompts_state))
        .merge(parley_chat::routes().with_state(chat_state))
}

/// CORS policy: the listed origins, or permissive when none are configured
pub fn build_cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Request body size limit
pub fn body_limit_layer() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

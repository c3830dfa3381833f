//! Route definitions for Chat domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::chat;
use super::middleware::ChatState;

/// Create all Chat domain API routes
pub fn routes() -> Router<ChatState> {
    Router::new()
        .route("/api/chat", post(chat::generate))
        .route("/v1/chat", post(chat::submit))
        .route("/v1/chat/status", get(chat::get_status))
}

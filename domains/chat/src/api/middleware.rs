//! Chat domain state
//!
//! The chat session owns handles to both stores, so the other domain
//! states can be derived from it.

use axum::extract::FromRef;
use parley_conversations::ConversationsState;
use parley_prompts::PromptsState;

use crate::session::ChatSession;

/// Application state for the Chat domain
#[derive(Clone)]
pub struct ChatState {
    pub session: ChatSession,
}

impl ChatState {
    pub fn new(session: ChatSession) -> Self {
        Self { session }
    }
}

impl FromRef<ChatState> for ConversationsState {
    fn from_ref(state: &ChatState) -> Self {
        ConversationsState::new(state.session.conversations.clone())
    }
}

impl FromRef<ChatState> for PromptsState {
    fn from_ref(state: &ChatState) -> Self {
        PromptsState::new(state.session.prompts.clone())
    }
}

//! Conversations domain state

use crate::store::SharedConversationStore;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub store: SharedConversationStore,
}

impl ConversationsState {
    pub fn new(store: SharedConversationStore) -> Self {
        Self { store }
    }
}

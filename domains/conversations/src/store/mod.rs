//! In-memory stores for the Conversations domain

pub mod conversations;

use std::sync::Arc;
use tokio::sync::RwLock;

pub use conversations::ConversationStore;

/// Conversation store shared between handlers and the chat session
pub type SharedConversationStore = Arc<RwLock<ConversationStore>>;

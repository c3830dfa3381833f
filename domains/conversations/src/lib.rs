//! Conversations domain: chat threads, messages, current selection

pub mod api;
pub mod domain;
pub mod store;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    Conversation, ConversationId, IdSequence, Message, MessageId, MessageRole,
};

// Re-export store types
pub use store::{ConversationStore, SharedConversationStore};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;

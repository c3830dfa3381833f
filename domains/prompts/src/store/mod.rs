//! In-memory store for the Prompts domain

pub mod prompts;

use std::sync::Arc;
use tokio::sync::RwLock;

pub use prompts::PromptStore;

/// Prompt store shared between handlers and the chat session
pub type SharedPromptStore = Arc<RwLock<PromptStore>>;

//! Prompts domain: system prompt presets and the active selection

pub mod api;
pub mod domain;
pub mod store;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Prompt, PromptId};

// Re-export store types
pub use store::{PromptStore, SharedPromptStore};

// Re-export API types
pub use api::routes;
pub use api::PromptsState;

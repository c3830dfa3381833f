//! Chat domain: response streaming, stream consumption, submit flow
//!
//! - [`respond`] filters a history, composes the system prompt and opens
//!   the provider stream
//! - [`consumer`] folds the event stream into a pending assistant message
//! - [`session`] runs a whole submission against the shared stores

pub mod api;
pub mod consumer;
pub mod respond;
pub mod session;

pub use consumer::{ChunkOutcome, ConsumerState, PendingMessage, SkipReason, StreamConsumer};
pub use respond::{generate_response, SystemPromptOverride};
pub use session::{ChatSession, SessionStatus, SubmitOutcome, Submission};

// Re-export API types
pub use api::routes;
pub use api::ChatState;

//! API layer for Prompts domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::PromptsState;
pub use routes::routes;

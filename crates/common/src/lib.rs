//! Shared configuration, error handling, and extractors for Parley
//!
//! This crate provides common functionality used across the Parley service:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Request extractors
//! - Monotonic identifier generation

pub mod config;
pub mod error;
pub mod extractors;
pub mod ids;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use ids::IdSequence;
pub use state::StateError;

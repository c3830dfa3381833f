//! API endpoint integration tests
//!
//! Drives the composed application router with a mock LLM service.

#![allow(dead_code)]

mod chat;
mod common;
mod conversations;
mod invariants;
mod prompts;

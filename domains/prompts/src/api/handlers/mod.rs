//! API handlers for Prompts domain

pub mod prompts;

//! API handlers for Conversations domain

pub mod conversations;
pub mod messages;

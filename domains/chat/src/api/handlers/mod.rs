//! API handlers for Chat domain

pub mod chat;

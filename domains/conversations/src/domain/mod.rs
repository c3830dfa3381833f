//! Domain layer for conversations

pub mod entities;

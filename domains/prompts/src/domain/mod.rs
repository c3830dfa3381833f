//! Domain layer for Prompts

pub mod entities;

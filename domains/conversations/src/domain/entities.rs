//! Domain entities for Conversations domain
//!
//! Conversations own an ordered, append-only list of messages. Identifiers
//! come from an [`IdSequence`], which hands out strictly increasing values
//! seeded from the wall clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_common::{Error, Result};

pub use parley_common::IdSequence;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Number of input characters used for an auto-derived title
pub const AUTO_TITLE_LENGTH: usize = 30;

/// Title given to conversations started with "new chat"
pub const DEFAULT_TITLE: &str = "New Chat";

/// Conversation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub u64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Finalized chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with the given role
    pub fn new(id: MessageId, role: MessageRole, content: String) -> Result<Self> {
        Self::validate_content(&content)?;

        Ok(Message {
            id,
            role,
            content,
            created_at: Utc::now(),
        })
    }

    /// Create a new user message
    pub fn new_user(id: MessageId, content: String) -> Result<Self> {
        Self::new(id, MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn new_assistant(id: MessageId, content: String) -> Result<Self> {
        Self::new(id, MessageRole::Assistant, content)
    }

    fn validate_content(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(())
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new, empty conversation
    pub fn new(id: ConversationId, title: String) -> Result<Self> {
        validate_title(&title)?;

        let now = Utc::now();
        Ok(Conversation {
            id,
            title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a conversation titled after the first user input
    pub fn from_first_input(id: ConversationId, input: &str) -> Result<Self> {
        let title: String = input.trim().chars().take(AUTO_TITLE_LENGTH).collect();
        Self::new(id, title)
    }

    /// Replace the title; messages and id are untouched
    pub fn rename(&mut self, title: String) -> Result<()> {
        validate_title(&title)?;
        self.title = title;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Append a finalized message
    pub fn push_message(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|m| m.created_at)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

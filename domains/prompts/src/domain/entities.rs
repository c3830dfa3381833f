//! Domain entities for Prompts domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_common::{Error, Result};

/// Maximum preset name length in characters
pub const MAX_NAME_LENGTH: usize = 100;

/// Prompt preset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(pub u64);

impl std::fmt::Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// System prompt preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Prompt {
    /// Create a new, inactive preset
    pub fn new(id: PromptId, name: String, content: String) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::Validation("Prompt name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Prompt name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        if content.trim().is_empty() {
            return Err(Error::Validation(
                "Prompt content cannot be empty".to_string(),
            ));
        }

        Ok(Prompt {
            id,
            name,
            content,
            is_active: false,
            created_at: Utc::now(),
        })
    }
}

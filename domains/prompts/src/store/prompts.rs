//! Prompt preset store

use std::sync::Arc;
use tokio::sync::RwLock;

use parley_common::{Error, IdSequence, Result};

use super::SharedPromptStore;
use crate::domain::entities::{Prompt, PromptId};

/// Prompt presets in creation order. At most one is active, maintained
/// by [`PromptStore::set_prompt_active`].
#[derive(Debug, Default)]
pub struct PromptStore {
    prompts: Vec<Prompt>,
    ids: IdSequence,
}

impl PromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store for sharing across tasks
    pub fn into_shared(self) -> SharedPromptStore {
        Arc::new(RwLock::new(self))
    }

    /// Append a new, inactive preset
    pub fn create_prompt(&mut self, name: String, content: String) -> Result<&Prompt> {
        let id = PromptId(self.ids.next_id());
        let prompt = Prompt::new(id, name, content)?;

        tracing::debug!(prompt_id = %id, name = %prompt.name, "Created prompt");

        self.prompts.push(prompt);
        Ok(&self.prompts[self.prompts.len() - 1])
    }

    pub fn delete_prompt(&mut self, id: PromptId) -> Result<Prompt> {
        let index = self
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        tracing::debug!(prompt_id = %id, "Deleted prompt");
        Ok(self.prompts.remove(index))
    }

    /// Activate or deactivate a preset. Activating one deactivates the rest.
    pub fn set_prompt_active(&mut self, id: PromptId, active: bool) -> Result<&Prompt> {
        let index = self
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        if active {
            for prompt in &mut self.prompts {
                prompt.is_active = prompt.id == id;
            }
        } else {
            self.prompts[index].is_active = false;
        }

        tracing::debug!(prompt_id = %id, active, "Updated active prompt");
        Ok(&self.prompts[index])
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn active_prompt(&self) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.is_active)
    }
}

fn not_found(id: PromptId) -> Error {
    Error::NotFound(format!("Prompt {}", id))
}

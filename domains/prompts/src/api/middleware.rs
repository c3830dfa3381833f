//! Prompts domain state

use crate::store::SharedPromptStore;

/// Application state for the Prompts domain
#[derive(Clone)]
pub struct PromptsState {
    pub store: SharedPromptStore,
}

impl PromptsState {
    pub fn new(store: SharedPromptStore) -> Self {
        Self { store }
    }
}

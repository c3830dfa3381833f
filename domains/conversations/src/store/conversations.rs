//! Conversation store

use std::sync::Arc;
use tokio::sync::RwLock;

use parley_common::{Error, Result};

use super::SharedConversationStore;
use crate::domain::entities::{Conversation, ConversationId, IdSequence, Message, MessageId};

/// Conversations in insertion order plus the current selection.
///
/// Not synchronized itself; share it through [`SharedConversationStore`].
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current: Option<ConversationId>,
    ids: IdSequence,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store for sharing across tasks
    pub fn into_shared(self) -> SharedConversationStore {
        Arc::new(RwLock::new(self))
    }

    pub fn next_conversation_id(&mut self) -> ConversationId {
        ConversationId(self.ids.next_id())
    }

    pub fn next_message_id(&mut self) -> MessageId {
        MessageId(self.ids.next_id())
    }

    /// Insert a new conversation and make it current
    pub fn add_conversation(&mut self, conversation: Conversation) -> Result<&Conversation> {
        if self.position(conversation.id).is_some() {
            return Err(Error::Conflict(format!(
                "Conversation {} already exists",
                conversation.id
            )));
        }

        tracing::debug!(
            conversation_id = %conversation.id,
            title = %conversation.title,
            "Adding conversation"
        );

        self.current = Some(conversation.id);
        self.conversations.push(conversation);
        Ok(&self.conversations[self.conversations.len() - 1])
    }

    /// Append a message to the matching conversation
    pub fn add_message(
        &mut self,
        conversation_id: ConversationId,
        message: Message,
    ) -> Result<&Message> {
        let conversation = self.find_mut(conversation_id)?;

        tracing::debug!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            role = %message.role,
            "Adding message"
        );

        conversation.push_message(message);
        let last = conversation.messages.len() - 1;
        Ok(&conversation.messages[last])
    }

    /// Remove a conversation, clearing the selection if it was current
    pub fn delete_conversation(&mut self, id: ConversationId) -> Result<Conversation> {
        let index = self.position(id).ok_or_else(|| not_found(id))?;
        let removed = self.conversations.remove(index);

        if self.current == Some(id) {
            self.current = None;
        }

        tracing::debug!(conversation_id = %id, "Deleted conversation");
        Ok(removed)
    }

    /// Rename a conversation in place
    pub fn update_conversation_title(
        &mut self,
        id: ConversationId,
        title: String,
    ) -> Result<&Conversation> {
        let conversation = self.find_mut(id)?;
        conversation.rename(title)?;
        Ok(conversation)
    }

    /// Select a conversation, or clear the selection with `None`
    pub fn set_current_conversation(&mut self, id: Option<ConversationId>) -> Result<()> {
        if let Some(id) = id {
            if self.position(id).is_none() {
                return Err(not_found(id));
            }
        }
        self.current = id;
        Ok(())
    }

    pub fn current_conversation_id(&self) -> Option<ConversationId> {
        self.current
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.current.and_then(|id| self.find(id))
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn find(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn messages(&self, id: ConversationId) -> Result<&[Message]> {
        self.find(id)
            .map(|c| c.messages.as_slice())
            .ok_or_else(|| not_found(id))
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn position(&self, id: ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn find_mut(&mut self, id: ConversationId) -> Result<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: ConversationId) -> Error {
    Error::NotFound(format!("Conversation {}", id))
}

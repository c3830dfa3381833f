//! Chat session: the submit flow
//!
//! A submission appends the user message, streams the model response
//! through a [`StreamConsumer`] and commits the result. Only one
//! submission runs at a time; the loading flag guards that.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parley_common::{Error, Result};
use parley_conversations::{
    Conversation, ConversationId, Message, MessageId, MessageRole, SharedConversationStore,
};
use parley_llm::{LlmMessage, LlmRole, LlmService};
use parley_prompts::SharedPromptStore;
use tokio::sync::RwLock;

use crate::consumer::{PendingMessage, StreamConsumer};
use crate::respond::{generate_response, SystemPromptOverride, INLINE_ERROR_MESSAGE};

/// Loading flag and top-level error banner
#[derive(Debug, Default)]
pub struct SessionStatus {
    loading: AtomicBool,
    error: RwLock<Option<String>>,
}

impl SessionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn error(&self) -> Option<String> {
        self.error.read().await.clone()
    }

    pub async fn set_error(&self, message: String) {
        *self.error.write().await = Some(message);
    }

    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }

    /// Set the loading flag, failing if it is already set
    fn begin(self: &Arc<Self>) -> Result<LoadingGuard> {
        self.loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::Conflict("A response is already in progress".to_string()))?;

        Ok(LoadingGuard {
            status: Arc::clone(self),
        })
    }
}

/// Clears the loading flag when dropped
#[derive(Debug)]
struct LoadingGuard {
    status: Arc<SessionStatus>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.status.loading.store(false, Ordering::SeqCst);
    }
}

/// What a finished submission did
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub conversation_id: ConversationId,
    pub user_message: Message,
    /// Committed response, or the inline error message
    pub assistant_message: Option<Message>,
    /// Failure message, whether stored inline or as the banner
    pub error: Option<String>,
}

/// Handles to everything a submission touches
#[derive(Clone)]
pub struct ChatSession {
    pub conversations: SharedConversationStore,
    pub prompts: SharedPromptStore,
    pub status: Arc<SessionStatus>,
    pub llm: Arc<dyn LlmService>,
}

impl ChatSession {
    pub fn new(
        conversations: SharedConversationStore,
        prompts: SharedPromptStore,
        llm: Arc<dyn LlmService>,
    ) -> Self {
        Self {
            conversations,
            prompts,
            status: Arc::new(SessionStatus::new()),
            llm,
        }
    }

    /// Run a whole submission, publishing each pending message to `on_pending`
    pub async fn submit<F>(&self, input: &str, on_pending: F) -> Result<SubmitOutcome>
    where
        F: FnMut(&PendingMessage) + Send,
    {
        let submission = self.begin(input).await?;
        Ok(submission.run(on_pending).await)
    }

    /// Validate the input, take the loading flag and append the user message.
    ///
    /// Errors here leave every store untouched.
    pub async fn begin(&self, input: &str) -> Result<Submission> {
        let content = input.trim();
        if content.is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }

        let guard = self.status.begin()?;
        self.status.clear_error().await;

        let (started_in, conversation_id, user_message, pending_id, history) = {
            let mut store = self.conversations.write().await;
            let started_in = store.current_conversation_id();

            let conversation_id = match started_in {
                Some(id) => id,
                None => {
                    let id = store.next_conversation_id();
                    store.add_conversation(Conversation::from_first_input(id, content)?)?;
                    id
                }
            };

            let message_id = store.next_message_id();
            let user_message = store
                .add_message(conversation_id, Message::new_user(message_id, content.to_string())?)?
                .clone();

            let history: Vec<LlmMessage> = store
                .messages(conversation_id)?
                .iter()
                .map(to_llm_message)
                .collect();

            (started_in, conversation_id, user_message, store.next_message_id(), history)
        };

        let system_prompt = self
            .prompts
            .read()
            .await
            .active_prompt()
            .map(|p| SystemPromptOverride::enabled(p.content.clone()));

        tracing::info!(
            conversation_id = %conversation_id,
            history = history.len(),
            prompt_override = system_prompt.is_some(),
            "Submitting chat message"
        );

        Ok(Submission {
            session: self.clone(),
            _guard: guard,
            started_in,
            conversation_id,
            user_message,
            pending_id,
            history,
            system_prompt,
        })
    }
}

/// An accepted submission waiting for its response.
///
/// Holds the loading flag until it is run or dropped.
pub struct Submission {
    session: ChatSession,
    _guard: LoadingGuard,
    started_in: Option<ConversationId>,
    conversation_id: ConversationId,
    user_message: Message,
    pending_id: MessageId,
    history: Vec<LlmMessage>,
    system_prompt: Option<SystemPromptOverride>,
}

impl Submission {
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn user_message(&self) -> &Message {
        &self.user_message
    }

    /// Stream the response and commit it, applying the error policy on
    /// failure. The loading flag is released on return.
    pub async fn run<F>(self, on_pending: F) -> SubmitOutcome
    where
        F: FnMut(&PendingMessage) + Send,
    {
        let response = self.stream_response(on_pending).await;

        let mut outcome = SubmitOutcome {
            conversation_id: self.conversation_id,
            user_message: self.user_message.clone(),
            assistant_message: None,
            error: None,
        };

        match response {
            Ok(Some(content)) => {
                outcome.assistant_message = self
                    .commit(self.conversation_id, self.pending_id, content)
                    .await;
            }
            Ok(None) => {
                tracing::info!(conversation_id = %self.conversation_id, "Empty response discarded");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    conversation_id = %self.conversation_id,
                    "Chat response failed"
                );
                let message = e.to_string();

                match self.started_in {
                    Some(id) => {
                        outcome.assistant_message = self
                            .commit(id, self.pending_id, INLINE_ERROR_MESSAGE.to_string())
                            .await;
                    }
                    None => self.session.status.set_error(message.clone()).await,
                }
                outcome.error = Some(message);
            }
        }

        outcome
    }

    async fn stream_response<F>(&self, on_pending: F) -> Result<Option<String>>
    where
        F: FnMut(&PendingMessage) + Send,
    {
        let stream = generate_response(
            self.session.llm.as_ref(),
            &self.history,
            self.system_prompt.as_ref(),
        )
        .await?;

        StreamConsumer::new(self.pending_id)
            .consume(stream, on_pending)
            .await
    }

    async fn commit(
        &self,
        conversation_id: ConversationId,
        id: MessageId,
        content: String,
    ) -> Option<Message> {
        let mut store = self.session.conversations.write().await;
        let committed = Message::new_assistant(id, content)
            .and_then(|message| store.add_message(conversation_id, message).cloned());

        match committed {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    conversation_id = %conversation_id,
                    "Could not commit assistant message"
                );
                None
            }
        }
    }
}

fn to_llm_message(message: &Message) -> LlmMessage {
    LlmMessage {
        role: match message.role {
            MessageRole::User => LlmRole::User,
            MessageRole::Assistant => LlmRole::Assistant,
        },
        content: message.content.clone(),
    }
}

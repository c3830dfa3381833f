//! Stream consumer
//!
//! Folds a provider event stream into one assistant message. Each chunk
//! is decoded independently; text fragments of `content_block_delta`
//! events are appended in order and everything else is skipped.

use parley_common::{Result, StateError};
use parley_conversations::{MessageId, MessageRole};
use parley_llm::{ByteStream, CONTENT_BLOCK_DELTA};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

/// Consumer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Streaming,
    Done,
}

impl std::fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumerState::Streaming => write!(f, "streaming"),
            ConsumerState::Done => write!(f, "done"),
        }
    }
}

/// Why a chunk contributed no text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing but whitespace
    Empty,
    InvalidJson,
    /// Valid event of another type
    NotDelta,
    /// Delta event without a text fragment
    MissingText,
}

/// Result of parsing one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Fragment(String),
    Skip(SkipReason),
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    text: Option<String>,
}

/// Parse one chunk.
///
/// Every non-empty line is an independent JSON event, so several events
/// coalesced into one chunk all contribute. Nothing is carried over to
/// the next chunk.
pub fn parse_chunk(chunk: &[u8]) -> ChunkOutcome {
    let text = String::from_utf8_lossy(chunk);

    let mut fragment: Option<String> = None;
    let mut reason = SkipReason::Empty;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Ok(piece) => fragment.get_or_insert_with(String::new).push_str(&piece),
            Err(r) => reason = r,
        }
    }

    match fragment {
        Some(text) => ChunkOutcome::Fragment(text),
        None => ChunkOutcome::Skip(reason),
    }
}

fn parse_line(line: &str) -> std::result::Result<String, SkipReason> {
    let event: StreamEvent = serde_json::from_str(line).map_err(|_| SkipReason::InvalidJson)?;

    if event.kind != CONTENT_BLOCK_DELTA {
        return Err(SkipReason::NotDelta);
    }

    event
        .delta
        .and_then(|d| d.text)
        .ok_or(SkipReason::MissingText)
}

/// Assistant message while it is still streaming
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
}

/// Accumulates fragments into a [`PendingMessage`]
#[derive(Debug)]
pub struct StreamConsumer {
    state: ConsumerState,
    pending: PendingMessage,
}

impl StreamConsumer {
    /// Start consuming; the finished message will carry `id`
    pub fn new(id: MessageId) -> Self {
        Self {
            state: ConsumerState::Streaming,
            pending: PendingMessage {
                id,
                role: MessageRole::Assistant,
                content: String::new(),
            },
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn pending(&self) -> &PendingMessage {
        &self.pending
    }

    /// Feed one chunk. Returns the updated pending message when the chunk
    /// carried text.
    pub fn accept(
        &mut self,
        chunk: &[u8],
    ) -> std::result::Result<Option<&PendingMessage>, StateError> {
        if self.state == ConsumerState::Done {
            return Err(StateError::InvalidTransition {
                from: ConsumerState::Done.to_string(),
                to: ConsumerState::Streaming.to_string(),
                event: "chunk".to_string(),
            });
        }

        match parse_chunk(chunk) {
            ChunkOutcome::Fragment(text) => {
                self.pending.content.push_str(&text);
                Ok(Some(&self.pending))
            }
            ChunkOutcome::Skip(reason) => {
                tracing::trace!(?reason, bytes = chunk.len(), "Skipped stream chunk");
                Ok(None)
            }
        }
    }

    /// Mark end of stream. Returns the accumulated content unless it is
    /// blank.
    pub fn finish(&mut self) -> std::result::Result<Option<String>, StateError> {
        if self.state == ConsumerState::Done {
            return Err(StateError::TerminalState(ConsumerState::Done.to_string()));
        }
        self.state = ConsumerState::Done;

        if self.pending.content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.pending.content)))
    }

    /// Drive `stream` to the end, publishing the pending message after each
    /// fragment. A transport error aborts consumption.
    pub async fn consume<F>(
        mut self,
        mut stream: ByteStream,
        mut on_pending: F,
    ) -> Result<Option<String>>
    where
        F: FnMut(&PendingMessage) + Send,
    {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(pending) = self.accept(&chunk)? {
                on_pending(pending);
            }
        }

        let content = self.finish()?;
        tracing::debug!(
            message_id = %self.pending.id,
            committed = content.is_some(),
            "Response stream finished"
        );
        Ok(content)
    }
}

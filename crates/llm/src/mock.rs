//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"` and by tests.
//! Streams deterministic events, counts calls and keeps the most recent
//! requests for inspection. Thread-safe via `Arc<Mutex<>>`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::{delta_chunk, ByteStream, CompletionRequest, LlmError, LlmService};

/// Requests kept for inspection; older ones are dropped
pub const MAX_RECORDED_REQUESTS: usize = 64;

#[derive(Debug, Clone)]
enum Script {
    /// Stream "Mock response to: <last message>" word by word
    Echo,
    /// Stream exactly these items
    Items(Vec<Result<Bytes, LlmError>>),
    /// Fail before any stream is opened
    Fail(LlmError),
}

/// Mock LLM service for testing
#[derive(Debug, Clone)]
pub struct MockLlmService {
    script: Script,
    requests: Arc<Mutex<VecDeque<CompletionRequest>>>,
    calls: Arc<AtomicUsize>,
}

impl MockLlmService {
    /// Create a mock that echoes the last message back as a stream of deltas
    pub fn new() -> Self {
        Self::with_script(Script::Echo)
    }

    /// Create a mock that streams the given raw chunks
    pub fn with_chunks(chunks: Vec<Bytes>) -> Self {
        Self::with_script(Script::Items(chunks.into_iter().map(Ok).collect()))
    }

    /// Create a mock that streams the given items, errors included
    pub fn with_items(items: Vec<Result<Bytes, LlmError>>) -> Self {
        Self::with_script(Script::Items(items))
    }

    /// Create a mock whose every call fails with `error`
    pub fn failing(error: LlmError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return the most recent requests, oldest first.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .expect("requests lock poisoned (prior test panicked)")
            .iter()
            .cloned()
            .collect()
    }

    /// Number of calls made against this mock.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn echo_items(request: &CompletionRequest) -> Vec<Result<Bytes, LlmError>> {
        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");

        let content = format!("Mock response to: {}", last_message);

        let mut items = vec![Ok(Bytes::from_static(
            b"{\"type\":\"message_start\",\"message\":{\"model\":\"mock-model\"}}\n",
        ))];
        items.extend(content.split_inclusive(' ').map(|word| Ok(delta_chunk(word))));
        items.push(Ok(Bytes::from_static(b"{\"type\":\"message_stop\"}\n")));
        items
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn stream(&self, request: CompletionRequest) -> Result<ByteStream, LlmError> {
        tracing::info!(
            messages = request.messages.len(),
            "Mock LLM service processing streaming request"
        );

        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut requests = self
                .requests
                .lock()
                .map_err(|e| LlmError::Request(format!("requests lock poisoned: {e}")))?;
            if requests.len() == MAX_RECORDED_REQUESTS {
                requests.pop_front();
            }
            requests.push_back(request.clone());
        }

        let items = match &self.script {
            Script::Echo => Self::echo_items(&request),
            Script::Items(items) => items.clone(),
            Script::Fail(error) => return Err(error.clone()),
        };

        Ok(Box::pin(tokio_stream::iter(items)))
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}

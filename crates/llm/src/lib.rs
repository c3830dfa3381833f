//! Parley LLM Service
//!
//! Streaming access to a model-completion provider:
//! - Anthropic Messages API with server-sent event decoding
//! - Mock service for tests and offline development
//! - Configurable provider, model, token limit and timeout
//!
//! Every implementation hands back a [`ByteStream`] whose chunks are the
//! provider's JSON events, one event per newline-terminated chunk.

pub mod anthropic;
pub mod mock;
pub mod sse;

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicService;
pub use mock::MockLlmService;

/// Default model used when a request does not name one
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Default completion token limit
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default time allowed to establish the stream
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Discriminator of the event that carries a text fragment
pub const CONTENT_BLOCK_DELTA: &str = "content_block_delta";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Missing API key: Please set ANTHROPIC_API_KEY in your environment variables or in your .env file.")]
    MissingApiKey,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("{0}")]
    Response(String),
}

impl From<LlmError> for parley_common::Error {
    fn from(err: LlmError) -> Self {
        use parley_common::Error;

        match err {
            LlmError::MissingApiKey => Error::Configuration(err.to_string()),
            LlmError::RateLimit => {
                Error::RateLimit("Rate limit exceeded. Please try again in a moment.".to_string())
            }
            LlmError::Connection(_) => Error::ServiceUnavailable(
                "Connection to Anthropic API failed. Please check your internet connection and API key."
                    .to_string(),
            ),
            LlmError::Authentication(_) => Error::Authentication(
                "Authentication failed. Please check your Anthropic API key.".to_string(),
            ),
            LlmError::Configuration(msg) | LlmError::Request(msg) | LlmError::Response(msg) => {
                Error::Internal(msg)
            }
        }
    }
}

/// Role of a message sent to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

/// A single message of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

/// Streaming completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name; empty means the service default
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

/// Raw event stream returned by a provider
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Build the JSON chunk of a text delta event, newline terminated
pub fn delta_chunk(text: &str) -> Bytes {
    let event = serde_json::json!({
        "type": CONTENT_BLOCK_DELTA,
        "index": 0,
        "delta": { "type": "text_delta", "text": text },
    });
    Bytes::from(format!("{}\n", event))
}

/// LLM service configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Provider (anthropic, mock)
    pub provider: String,
    /// Provider API key; absence is reported per request, not at startup
    pub api_key: Option<String>,
    /// Override for the provider base URL
    pub base_url: Option<String>,
    pub default_model: String,
    pub max_tokens: u32,
    /// Time allowed to connect and receive response headers
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            api_key: None,
            base_url: None,
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or(defaults.provider);

        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_url = std::env::var("ANTHROPIC_BASE_URL").ok();

        let default_model = std::env::var("LLM_MODEL").unwrap_or(defaults.default_model);

        let max_tokens = match std::env::var("LLM_MAX_TOKENS") {
            Ok(raw) => raw.parse().map_err(|_| {
                LlmError::Configuration(format!("LLM_MAX_TOKENS must be a number, got {raw:?}"))
            })?,
            Err(_) => defaults.max_tokens,
        };

        let timeout = match std::env::var("LLM_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                LlmError::Configuration(format!("LLM_TIMEOUT_SECS must be a number, got {raw:?}"))
            })?),
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            provider,
            api_key,
            base_url,
            default_model,
            max_tokens,
            timeout,
        })
    }
}

/// LLM service trait for different providers
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Start a streaming completion and return the provider's raw event stream
    async fn stream(&self, request: CompletionRequest) -> Result<ByteStream, LlmError>;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// Factory for creating LlmService implementations
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create an LlmService based on configuration
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "anthropic" => {
                tracing::info!(model = %config.default_model, "Creating Anthropic LLM service");
                if config.api_key.is_none() {
                    tracing::warn!(
                        "ANTHROPIC_API_KEY is not set; chat requests will fail until it is configured"
                    );
                }
                Ok(Box::new(AnthropicService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: anthropic, mock",
                provider
            ))),
        }
    }
}

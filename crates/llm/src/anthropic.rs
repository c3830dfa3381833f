//! Anthropic Claude API Implementation
//!
//! Calls the Anthropic Messages API (https://api.anthropic.com/v1/messages)
//! in streaming mode and re-emits every server-sent event payload as one
//! newline-terminated JSON chunk.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

use crate::sse::{SseDecoder, SseEvent};
use crate::{ByteStream, CompletionRequest, LlmConfig, LlmError, LlmRole, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API request body
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<MessageBody<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    role: LlmRole,
    content: &'a str,
}

/// Anthropic API error body, used both for HTTP errors and `error` stream events
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl ApiError {
    fn into_llm_error(self) -> LlmError {
        match self.error_type.as_str() {
            "rate_limit_error" => LlmError::RateLimit,
            "authentication_error" | "permission_error" => LlmError::Authentication(self.message),
            _ => LlmError::Response(format!(
                "Anthropic API error ({}): {}",
                self.error_type, self.message
            )),
        }
    }
}

/// Anthropic LLM service implementation
pub struct AnthropicService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl AnthropicService {
    /// Create a new Anthropic service
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }
}

fn transport_error(err: reqwest::Error) -> LlmError {
    if err.is_connect() || err.is_timeout() {
        LlmError::Connection(err.to_string())
    } else {
        LlmError::Request(format!("HTTP request failed: {}", err))
    }
}

/// Turn a decoded event into the chunk handed to the caller
fn forward_event(event: SseEvent) -> Result<Option<Bytes>, LlmError> {
    if event.data.is_empty() {
        return Ok(None);
    }

    if event.event.as_deref() == Some("error") || event.data.contains("\"type\":\"error\"") {
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&event.data) {
            return Err(error_response.error.into_llm_error());
        }
    }

    // Multi-line payloads are joined with spaces so each event stays one line
    let line = event.data.replace('\n', " ");
    Ok(Some(Bytes::from(format!("{}\n", line))))
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn stream(&self, request: CompletionRequest) -> Result<ByteStream, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let body = MessagesRequest {
            model,
            max_tokens,
            system: request.system_prompt.as_deref(),
            messages: request
                .messages
                .iter()
                .map(|m| MessageBody {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            stream: true,
        };

        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            model = %model,
            max_tokens = %max_tokens,
            messages = body.messages.len(),
            "Sending Anthropic streaming request"
        );

        let send = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.config.timeout, send)
            .await
            .map_err(|_| {
                LlmError::Connection(format!(
                    "No response within {} ms",
                    self.config.timeout.as_millis()
                ))
            })?
            .map_err(transport_error)?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            let parsed = serde_json::from_str::<ErrorResponse>(&error_body).ok();

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                let message = parsed
                    .map(|e| e.error.message)
                    .unwrap_or_else(|| error_body.clone());
                return Err(LlmError::Authentication(message));
            }

            if let Some(error_response) = parsed {
                return Err(error_response.error.into_llm_error());
            }

            return Err(LlmError::Response(format!(
                "Anthropic API returned {}: {}",
                status, error_body
            )));
        }

        tracing::debug!(status = %status, "Anthropic stream opened");

        let mut upstream = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = upstream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(transport_error(e));
                        return;
                    }
                };

                for event in decoder.push(&chunk) {
                    match forward_event(event) {
                        Ok(Some(bytes)) => yield Ok(bytes),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(event) = decoder.finish() {
                match forward_event(event) {
                    Ok(Some(bytes)) => yield Ok(bytes),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }

            tracing::debug!("Anthropic stream finished");
        };

        Ok(Box::pin(stream))
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

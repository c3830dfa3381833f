//! Model response generation
//!
//! Stateless: every call filters the history it is given, composes the
//! system prompt and opens a fresh provider stream.

use parley_common::{Error, Result};
use parley_llm::{ByteStream, CompletionRequest, LlmMessage, LlmService};
use serde::{Deserialize, Serialize};

/// Messages starting with this prefix are earlier failures, never history
pub const ERROR_PREFIX: &str = "Sorry, I encountered an error";

/// Assistant message stored in place of a failed response
pub const INLINE_ERROR_MESSAGE: &str = "Sorry, I encountered an error processing your request.";

/// Built-in formatting instructions sent with every request
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Parley, an AI assistant using Markdown for clear and structured responses. Format your responses following these guidelines:

1. Use headers for sections:
   # For main topics
   ## For subtopics
   ### For subsections

2. For lists and steps:
   - Use bullet points for unordered lists
   - Number steps when sequence matters

3. For code:
   - Use inline `code` for short snippets
   - Use triple backticks with language for blocks:
   ```python
   def example():
       return "like this"
   ```

4. For emphasis:
   - Use **bold** for important points
   - Use *italics* for emphasis
   - Use > for important quotes or callouts

5. For structured data:
   | Use | Tables |
   |-----|---------|
   | When | Needed |

6. Break up long responses with:
   - Clear section headers
   - Appropriate spacing between sections
   - Bullet points for better readability
   - Short, focused paragraphs

7. For technical content:
   - Always specify language for code blocks
   - Use inline `code` for technical terms
   - Include example usage where helpful

Keep responses concise and well-structured. Use appropriate Markdown formatting to enhance readability and understanding."#;

/// Extra instructions appended to the default system prompt when enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPromptOverride {
    pub value: String,
    pub enabled: bool,
}

impl SystemPromptOverride {
    pub fn enabled(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: true,
        }
    }
}

/// Drop blank messages and earlier error messages; trim the rest
pub fn filter_messages(messages: &[LlmMessage]) -> Vec<LlmMessage> {
    messages
        .iter()
        .filter(|m| !m.content.trim().is_empty() && !m.content.starts_with(ERROR_PREFIX))
        .map(|m| LlmMessage {
            role: m.role,
            content: m.content.trim().to_string(),
        })
        .collect()
}

/// Default instructions, followed by a blank line and the override when enabled
pub fn compose_system_prompt(system_prompt: Option<&SystemPromptOverride>) -> String {
    match system_prompt {
        Some(o) if o.enabled => format!("{}\n\n{}", DEFAULT_SYSTEM_PROMPT, o.value),
        _ => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}

/// Open a streaming completion for `messages`.
///
/// Fails with a validation error, without contacting the provider, when
/// nothing is left after filtering. Provider failures are mapped to their
/// caller-facing errors.
pub async fn generate_response(
    llm: &dyn LlmService,
    messages: &[LlmMessage],
    system_prompt: Option<&SystemPromptOverride>,
) -> Result<ByteStream> {
    let messages = filter_messages(messages);
    if messages.is_empty() {
        return Err(Error::Validation("No valid messages to send".to_string()));
    }

    let system = compose_system_prompt(system_prompt);

    tracing::debug!(
        override_enabled = system_prompt.is_some_and(|o| o.enabled),
        override_len = system_prompt.map(|o| o.value.len()).unwrap_or(0),
        system_prompt_len = system.len(),
        messages = messages.len(),
        "System prompt configuration"
    );

    let request = CompletionRequest {
        model: String::new(),
        system_prompt: Some(system),
        messages,
        max_tokens: None,
    };

    llm.stream(request).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to start model response");
        Error::from(e)
    })
}

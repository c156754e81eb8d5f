//! Provider types
//!
//! Defines the `LLMProvider` seam between the agent loop and whatever
//! produces model responses, plus the chat option and response types
//! shared by the live and mock implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::session::Message;

/// The model behind the conversation.
///
/// Implementations translate between the session's message format and
/// their own wire format. `MockProvider` implements the same trait so
/// the whole loop can run without network access.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send the conversation to the model.
    ///
    /// # Arguments
    /// * `system` - System prompt (kept out of the message list)
    /// * `messages` - Conversation history, oldest first
    /// * `tools` - Tool definitions in Messages-API schema form
    /// * `options` - Model, token, and sampling settings
    async fn chat(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Value],
        options: &ChatOptions,
    ) -> Result<LLMResponse>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Options for a chat completion request.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            temperature: None,
        }
    }
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Text content, if the model produced any
    pub content: Option<String>,
    /// Tool calls the model wants executed (empty for a terminal answer)
    pub tool_calls: Vec<LLMToolCall>,
    /// Token usage, when the provider reports it
    pub usage: Option<Usage>,
}

impl LLMResponse {
    /// A plain text response with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: vec![],
            usage: None,
        }
    }

    /// A response requesting tool execution.
    pub fn with_tools(content: Option<String>, tool_calls: Vec<LLMToolCall>) -> Self {
        Self {
            content,
            tool_calls,
            usage: None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A tool call issued by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMToolCall {
    /// Id the tool result must reference
    pub id: String,
    pub name: String,
    /// Parsed JSON arguments
    pub input: Value,
}

impl LLMToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Token usage for one completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Classify an HTTP error status into a typed provider error.
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        500..=599 => ProviderError::ServerError {
            status,
            message: body.to_string(),
        },
        _ => ProviderError::Api(format!("HTTP {}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_helpers() {
        let response = LLMResponse::text("Hello");
        assert_eq!(response.content.as_deref(), Some("Hello"));
        assert!(!response.has_tool_calls());

        let call = LLMToolCall::new("toolu_1", "get_shipping_rates", json!({"to_zip": "90001"}));
        let response = LLMResponse::with_tools(None, vec![call]);
        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls[0].name, "get_shipping_rates");
    }

    #[test]
    fn chat_options_defaults() {
        let options = ChatOptions::default();
        assert_eq!(options.model, "claude-sonnet-4-20250514");
        assert_eq!(options.max_tokens, 1024);
        assert!(options.temperature.is_none());

        let options = ChatOptions::new().with_model("claude-opus-4").with_max_tokens(2048);
        assert_eq!(options.model, "claude-opus-4");
        assert_eq!(options.max_tokens, 2048);
    }

    #[test]
    fn status_classification() {
        assert!(matches!(parse_provider_error(401, "bad key"), ProviderError::Auth(_)));
        assert!(matches!(parse_provider_error(403, "forbidden"), ProviderError::Auth(_)));
        assert!(matches!(parse_provider_error(429, "slow down"), ProviderError::RateLimit(_)));
        assert!(matches!(
            parse_provider_error(400, "bad body"),
            ProviderError::InvalidRequest(_)
        ));
        assert!(matches!(
            parse_provider_error(529, "overloaded"),
            ProviderError::ServerError { status: 529, .. }
        ));
        assert!(matches!(parse_provider_error(418, "teapot"), ProviderError::Api(_)));
    }

    #[test]
    fn usage_total() {
        let usage = Usage::new(100, 50);
        assert_eq!(usage.total(), 150);
    }
}

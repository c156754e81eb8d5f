//! Claude (Anthropic) LLM provider
//!
//! Implements `LLMProvider` against the Messages API: message and tool
//! conversion both ways, typed error classification by HTTP status.
//!
//! # Example
//!
//! ```rust,ignore
//! use shipmate::providers::{ChatOptions, ClaudeProvider, LLMProvider};
//! use shipmate::session::Message;
//!
//! async fn example() {
//!     let provider = ClaudeProvider::new("your-api-key");
//!     let messages = vec![Message::user("Where is order #1001?")];
//!     let response = provider
//!         .chat("You are a shipping assistant.", &messages, &[], &ChatOptions::default())
//!         .await
//!         .unwrap();
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ProviderError, Result, ShipmateError};
use crate::session::{ContentBlock, Message, Role};

use super::{parse_provider_error, ChatOptions, LLMProvider, LLMResponse, LLMToolCall, Usage};

/// The Messages API endpoint.
const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// The Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude LLM provider.
pub struct ClaudeProvider {
    api_key: String,
    client: Client,
}

impl ClaudeProvider {
    /// Create a provider with the given API key and a 120s HTTP timeout.
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Create a provider with a custom HTTP client, for tests or custom
    /// timeout/proxy configuration.
    pub fn with_client(api_key: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            client,
        }
    }
}

#[async_trait]
impl LLMProvider for ClaudeProvider {
    async fn chat(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Value],
        options: &ChatOptions,
    ) -> Result<LLMResponse> {
        let request = ClaudeRequest {
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            messages: convert_messages(messages),
            system: if system.is_empty() {
                None
            } else {
                Some(system.to_string())
            },
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.to_vec())
            },
            temperature: options.temperature,
        };
        debug!(model = %request.model, messages = request.messages.len(), "calling claude");

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();

            let body = match serde_json::from_str::<ClaudeErrorResponse>(&error_text) {
                Ok(parsed) => format!("{}: {}", parsed.error.r#type, parsed.error.message),
                Err(_) => error_text,
            };
            return Err(ShipmateError::from(parse_provider_error(status, &body)));
        }

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(classify_transport_error)?;
        Ok(convert_response(claude_response))
    }

    fn name(&self) -> &str {
        "claude"
    }
}

fn classify_transport_error(err: reqwest::Error) -> ShipmateError {
    let provider_err = if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_connect() {
        ProviderError::Connection(err.to_string())
    } else {
        ProviderError::Api(err.to_string())
    };
    ShipmateError::from(provider_err)
}

/// Claude API request body.
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A message in Claude wire format. The session's `ContentBlock` tagging
/// matches the API's, so blocks serialize directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: Vec<ContentBlock>,
}

/// Claude API response body.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    usage: ClaudeUsage,
    #[allow(dead_code)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
    error: ClaudeError,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    r#type: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Convert session messages to wire messages. System content is carried
/// in the request's `system` field, so system-role messages are skipped.
fn convert_messages(messages: &[Message]) -> Vec<ClaudeMessage> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| ClaudeMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        })
        .collect()
}

fn convert_response(response: ClaudeResponse) -> LLMResponse {
    let mut text_parts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<LLMToolCall> = Vec::new();

    for block in response.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(LLMToolCall::new(id, name, input));
            }
            // Tool results never appear in model output; ignore if they do.
            ContentBlock::ToolResult { .. } => {}
        }
    }

    LLMResponse {
        content: if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        },
        tool_calls,
        usage: Some(Usage::new(
            response.usage.input_tokens,
            response.usage.output_tokens,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_name() {
        let provider = ClaudeProvider::new("test-key");
        assert_eq!(provider.name(), "claude");
    }

    #[test]
    fn message_conversion_skips_system() {
        let messages = vec![
            Message {
                role: Role::System,
                content: vec![ContentBlock::text("system text")],
                timestamp: chrono::Utc::now(),
            },
            Message::user("Hello"),
            Message::assistant("Hi there!"),
        ];

        let converted = convert_messages(&messages);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[1].role, "assistant");
    }

    #[test]
    fn tool_results_convert_as_user_blocks() {
        let messages = vec![Message::tool_results(vec![ContentBlock::tool_result(
            "toolu_1",
            "Shipment created successfully!",
        )])];

        let converted = convert_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");

        let wire = serde_json::to_value(&converted[0]).unwrap();
        assert_eq!(wire["content"][0]["type"], "tool_result");
        assert_eq!(wire["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn response_conversion_splits_text_and_tools() {
        let response = ClaudeResponse {
            content: vec![
                ContentBlock::text("Let me check the rates."),
                ContentBlock::tool_use(
                    "toolu_01",
                    "get_shipping_rates",
                    json!({"to_zip": "90001", "weight_oz": 32}),
                ),
            ],
            usage: ClaudeUsage {
                input_tokens: 20,
                output_tokens: 30,
            },
            stop_reason: Some("tool_use".to_string()),
        };

        let llm_response = convert_response(response);
        assert_eq!(llm_response.content.as_deref(), Some("Let me check the rates."));
        assert!(llm_response.has_tool_calls());
        assert_eq!(llm_response.tool_calls[0].name, "get_shipping_rates");
        assert_eq!(llm_response.tool_calls[0].input["to_zip"], "90001");
        assert_eq!(llm_response.usage.map(|u| u.total()), Some(50));
    }

    #[test]
    fn response_with_only_tools_has_no_content() {
        let response = ClaudeResponse {
            content: vec![ContentBlock::tool_use("toolu_01", "get_unfulfilled_orders", json!({}))],
            usage: ClaudeUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
            stop_reason: Some("tool_use".to_string()),
        };
        let llm_response = convert_response(response);
        assert!(llm_response.content.is_none());
        assert_eq!(llm_response.tool_calls.len(), 1);
    }

    #[test]
    fn request_serialization_skips_empty_optionals() {
        let request = ClaudeRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            messages: vec![],
            system: None,
            tools: None,
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("system"));
        assert!(!json.contains("tools"));
        assert!(!json.contains("temperature"));

        let request = ClaudeRequest {
            system: Some("You are a shipping assistant.".to_string()),
            ..request
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("You are a shipping assistant."));
    }
}

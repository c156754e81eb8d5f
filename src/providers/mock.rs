//! Mock LLM provider for offline mode
//!
//! A deterministic keyword-based intent router standing in for the live
//! model. It classifies the latest user message, extracts slots with the
//! `nl` parser, and issues the same tool calls a real model would, so
//! the full agent loop and tool executor run unchanged without an API
//! key. On the follow-up turn (tool results present) it renders a final
//! text answer from the results.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::Result;
use crate::nl;
use crate::session::{ContentBlock, Message, Role};

use super::{ChatOptions, LLMProvider, LLMResponse, LLMToolCall};

static TRACKING_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(1Z\d{9}|94\d{9}|78\d{9})\b").ok());

static ORDER_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(ORD-\d+|#?\d{4,})").ok());

static RATE_ID_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\[rate_id: (rate_\d+)\]").ok());

const NO_RATES_CACHED: &str = "No rates in cache. Please get shipping rates first by saying \
                               something like 'get rates to LA for 2lb package'.";

const DEFAULT_HELP: &str = "I can help you with:

- **Get rates**: \"What are the rates to ship a 2lb package to Los Angeles?\"
- **Validate address**: \"Is 123 Main St, LA, CA 90001 a valid address?\"
- **Create shipment**: \"Ship it with the cheapest option\"
- **View orders**: \"Show my unfulfilled orders\"
- **Track packages**: \"Where is order #1001?\"
- **Bulk shipping**: \"Ship all orders under 1lb\"

What would you like to do?";

/// Keyword-driven stand-in for the live model.
pub struct MockProvider {
    counter: AtomicU64,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("toolu_mock_{}", n)
    }

    fn tool_call(&self, name: &str, input: Value) -> LLMResponse {
        LLMResponse::with_tools(None, vec![LLMToolCall::new(self.next_id(), name, input)])
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn chat(
        &self,
        _system: &str,
        messages: &[Message],
        _tools: &[Value],
        _options: &ChatOptions,
    ) -> Result<LLMResponse> {
        // Follow-up turn: tool results just came back, render the answer.
        if messages.last().is_some_and(|m| m.has_tool_results()) {
            return Ok(render_results(messages));
        }

        let user_text = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !m.has_tool_results())
            .map(|m| m.text())
            .unwrap_or_default();
        let lower = user_text.to_lowercase();
        let parsed = nl::parse_shipping_input(&user_text);

        let contains_any =
            |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if contains_any(&["rate", "cost", "price", "how much", "ship to"]) {
            return Ok(self.tool_call("get_shipping_rates", parsed.to_rates_input()));
        }

        if contains_any(&["valid", "check", "verify"]) {
            return Ok(self.tool_call(
                "validate_address",
                json!({
                    "name": "Recipient",
                    "street": "123 Main St",
                    "city": parsed.city.as_deref().unwrap_or("Los Angeles"),
                    "state": parsed.state.unwrap_or("CA"),
                    "zip": parsed.zip_code.as_deref().unwrap_or("90001"),
                }),
            ));
        }

        if contains_any(&["ship it", "create", "buy", "use the"]) {
            // Cheapest = first rate_id rendered in the latest rates result.
            let Some(rate_id) = latest_rate_id(messages) else {
                return Ok(LLMResponse::text(NO_RATES_CACHED));
            };
            let slots = latest_rates_request(messages);
            return Ok(self.tool_call(
                "create_shipment",
                json!({
                    "to_name": "Recipient",
                    "to_street": "123 Main St",
                    "to_city": parsed.city.as_deref()
                        .or_else(|| slots.as_ref().and_then(|s| s["to_city"].as_str()))
                        .unwrap_or("Los Angeles"),
                    "to_state": parsed.state
                        .map(str::to_string)
                        .or_else(|| slots.as_ref().and_then(|s| s["to_state"].as_str().map(str::to_string)))
                        .unwrap_or_else(|| "CA".to_string()),
                    "to_zip": parsed.zip_code.as_deref()
                        .or_else(|| slots.as_ref().and_then(|s| s["to_zip"].as_str()))
                        .unwrap_or("90001"),
                    "weight_oz": parsed.weight_oz
                        .or_else(|| slots.as_ref().and_then(|s| s["weight_oz"].as_f64()))
                        .unwrap_or(32.0),
                    "rate_id": rate_id,
                }),
            ));
        }

        if contains_any(&["track", "where is", "status"]) {
            if let Some(number) = TRACKING_RE
                .as_ref()
                .and_then(|re| re.captures(&user_text))
                .map(|c| c[1].to_string())
            {
                return Ok(self.tool_call("get_tracking_status", json!({"tracking_number": number})));
            }
            if let Some(raw) = ORDER_RE
                .as_ref()
                .and_then(|re| re.captures(&user_text))
                .map(|c| c[1].to_string())
            {
                return Ok(self.tool_call(
                    "get_tracking_status",
                    json!({"order_id": normalize_order_id(&raw)}),
                ));
            }
            return Ok(LLMResponse::text(
                "Please provide a tracking number or order ID to track.",
            ));
        }

        if contains_any(&["bulk", "ship all", "batch"]) {
            let mut input = json!({"cheapest": true});
            if lower.contains("under 1 lb") || lower.contains("under 1lb") || lower.contains("under 16 oz")
            {
                input["filter"] = json!({"max_weight_oz": 16});
            } else if lower.contains("california") || lower.contains(" ca") {
                input["filter"] = json!({"destination_state": "CA"});
            }
            if lower.contains("yes") || lower.contains("confirm") || lower.contains("proceed") {
                input["confirmed"] = json!(true);
            }
            return Ok(self.tool_call("bulk_ship_orders", input));
        }

        if contains_any(&["order", "unfulfilled", "pending", "need to ship"]) {
            let mut input = json!({"limit": 20});
            if lower.contains("california") || lower.contains(" ca") {
                input["search"] = json!("CA");
            } else if lower.contains("texas") || lower.contains(" tx") {
                input["search"] = json!("TX");
            }
            return Ok(self.tool_call("get_unfulfilled_orders", input));
        }

        Ok(LLMResponse::text(DEFAULT_HELP))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Final answer after tool execution: the result text, plus a follow-up
/// question after a rates listing.
fn render_results(messages: &[Message]) -> LLMResponse {
    let results: Vec<&str> = messages
        .last()
        .map(|m| {
            m.content
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let content = results.join("\n\n");

    let last_tool = messages
        .iter()
        .rev()
        .find(|m| m.has_tool_uses())
        .and_then(|m| m.tool_uses().first().map(|(_, name, _)| name.to_string()));

    match last_tool.as_deref() {
        Some("get_shipping_rates") => LLMResponse::text(format!(
            "{}\n\nWould you like me to ship with any of these options?",
            content
        )),
        _ => LLMResponse::text(content),
    }
}

/// First rate id in the most recent rates tool result, which is the
/// cheapest since results render sorted ascending.
fn latest_rate_id(messages: &[Message]) -> Option<String> {
    let re = RATE_ID_RE.as_ref()?;
    messages.iter().rev().find_map(|m| {
        m.content.iter().find_map(|b| match b {
            ContentBlock::ToolResult { content, .. } => {
                re.captures(content).map(|c| c[1].to_string())
            }
            _ => None,
        })
    })
}

/// Input of the most recent `get_shipping_rates` call, for carrying
/// destination and weight into a follow-up shipment.
fn latest_rates_request(messages: &[Message]) -> Option<Value> {
    messages.iter().rev().find_map(|m| {
        m.tool_uses()
            .into_iter()
            .find(|(_, name, _)| *name == "get_shipping_rates")
            .map(|(_, _, input)| input.clone())
    })
}

fn normalize_order_id(raw: &str) -> String {
    if let Some(digits) = raw.strip_prefix('#') {
        format!("ORD-{}", digits)
    } else if raw.starts_with("ORD-") {
        raw.to_string()
    } else {
        format!("ORD-{}", raw)
    }
}

//! Conversation history with token estimation and lossy summarization
//!
//! The store owns the ordered message history for one session. When the
//! estimated token count of the history (plus the system prompt) crosses
//! `SUMMARIZE_THRESHOLD_TOKENS`, everything except the most recent
//! `2 * keep_turns` messages is collapsed into a single synthetic summary
//! exchange. Recency is preserved over completeness.

use tracing::info;

use super::types::{ContentBlock, Message};

/// Rough token estimate: about 4 characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimated-token ceiling before old turns are summarized.
pub const SUMMARIZE_THRESHOLD_TOKENS: usize = 50_000;

/// Number of recent turn-pairs kept verbatim through summarization.
pub const KEEP_RECENT_TURNS: usize = 5;

const SUMMARY_ACK: &str = "I understand. Let me continue helping you with your shipping needs.";

/// Estimate token count from text length.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// Ordered message history for one session.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the history.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full history, or the last `limit` messages if a limit is given.
    pub fn get(&self, limit: Option<usize>) -> &[Message] {
        match limit {
            Some(n) if n < self.messages.len() => &self.messages[self.messages.len() - n..],
            _ => &self.messages,
        }
    }

    /// Replace the entire history.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Estimated tokens across the system prompt and every message.
    pub fn estimated_tokens(&self, system_prompt: &str) -> usize {
        let mut total = estimate_tokens(system_prompt);
        for msg in &self.messages {
            total += msg.char_len() / CHARS_PER_TOKEN;
        }
        total
    }

    /// Collapse all but the most recent `2 * keep_turns` messages into a
    /// synthetic summary exchange.
    ///
    /// The older slice is rendered one line per content block (free text
    /// truncated to 200 characters, tool activity reduced to short
    /// descriptive lines) and spliced back as a user message plus a fixed
    /// assistant acknowledgement. No-op when the history is short enough.
    ///
    /// Returns `true` if summarization ran.
    pub fn summarize(&mut self, keep_turns: usize) -> bool {
        let keep = keep_turns * 2;
        if self.messages.len() <= keep {
            return false;
        }

        let split = self.messages.len() - keep;
        let old = &self.messages[..split];
        let summary = render_summary(old);

        let before = self.messages.len();
        let mut new_messages = vec![
            Message::user(format!("[Conversation context]\n{}", summary)),
            Message::assistant(SUMMARY_ACK),
        ];
        new_messages.extend_from_slice(&self.messages[split..]);
        self.messages = new_messages;

        info!(
            "Summarized conversation: {} messages -> {} messages",
            before,
            self.messages.len()
        );
        true
    }
}

/// Render old messages into the one-line-per-block summary body.
fn render_summary(messages: &[Message]) -> String {
    let mut parts = vec!["Previous conversation summary:".to_string()];
    for msg in messages {
        for block in &msg.content {
            match block {
                ContentBlock::Text { text } => {
                    let text = if text.len() > 200 {
                        format!("{}...", truncate_at_boundary(text, 200))
                    } else {
                        text.clone()
                    };
                    parts.push(format!("- {}: {}", msg.role, text));
                }
                ContentBlock::ToolUse { name, .. } => {
                    parts.push(format!("- tool call: {}", name));
                }
                ContentBlock::ToolResult { content, .. } => {
                    parts.push(format!("- tool result: {}...", truncate_at_boundary(content, 100)));
                }
            }
        }
    }
    parts.join("\n")
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

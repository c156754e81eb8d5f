//! Providers module - LLM backends
//!
//! `LLMProvider` is the seam the agent loop talks through. Two
//! implementations: `ClaudeProvider` against the Anthropic Messages API,
//! and `MockProvider`, a deterministic keyword router for offline use.

pub mod claude;
pub mod mock;
mod types;

pub use claude::ClaudeProvider;
pub use mock::MockProvider;
pub use types::{
    parse_provider_error, ChatOptions, LLMProvider, LLMResponse, LLMToolCall, Usage,
};

//! Shipmate - conversational shipping assistant for merchants
//!
//! The agent loop in [`agent`] drives a tool-calling conversation with an
//! LLM provider; the tools in [`tools`] act on orders, rates, and
//! shipments; [`session`] keeps per-customer conversation state.

pub mod agent;
pub mod config;
pub mod error;
pub mod nl;
pub mod orders;
pub mod providers;
pub mod rates;
pub mod session;
pub mod shipping;
pub mod tools;

pub use agent::{AgentLoop, ChatEvent};
pub use config::Config;
pub use error::{ProviderError, Result, ShipmateError};
pub use orders::{CustomerContext, OrderBook, PlanTier};
pub use providers::{ChatOptions, ClaudeProvider, LLMProvider, LLMResponse, LLMToolCall, Usage};
pub use session::{ContentBlock, Message, Role, Session, SessionRegistry};
pub use tools::{ToolCall, ToolExecutor};

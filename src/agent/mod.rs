//! Agent module - the tool-calling conversation loop
//!
//! `AgentLoop` owns the model-side of a chat turn: prompt assembly,
//! the tool-use/tool-result cycle, summarization, and the mapping of
//! transport failures to user-facing apologies. `ChatEvent` is the
//! optional progress stream for interactive callers.

mod events;
mod r#loop;

pub use events::ChatEvent;
pub use r#loop::{transport_apology, AgentLoop};

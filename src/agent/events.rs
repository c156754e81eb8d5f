//! Progress events emitted while a turn runs
//!
//! Callers that want live feedback (a chat UI, the CLI spinner) pass an
//! `mpsc::Sender<ChatEvent>` to the loop; everyone else ignores events
//! and just takes the returned string.

use serde::{Deserialize, Serialize};

/// One progress event during a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Loop state change, e.g. waiting on the model
    Status { message: String },
    /// A tool call is about to execute
    ToolStart { tool: String },
    /// A tool call finished (successfully or with a caught error)
    ToolComplete { tool: String },
    /// A piece of the final answer text
    Chunk { text: String },
    /// The turn finished; `text` is the complete answer
    Complete { text: String },
    /// The turn failed; `message` is the user-facing apology
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_by_type() {
        let event = ChatEvent::ToolStart {
            tool: "get_shipping_rates".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool_start");
        assert_eq!(value["tool"], "get_shipping_rates");

        let event = ChatEvent::Complete {
            text: "done".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "complete");

        let round: ChatEvent = serde_json::from_value(value).unwrap();
        assert_eq!(
            round,
            ChatEvent::Complete {
                text: "done".to_string()
            }
        );
    }
}

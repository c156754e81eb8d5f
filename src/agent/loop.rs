//! The agent loop
//!
//! Drives one user turn to completion: send history to the model, run
//! any tool calls it issues, feed the results back, repeat until the
//! model answers in plain text. The loop has no iteration cap; a model
//! that keeps issuing tool calls keeps the turn open, which is accepted
//! and visible in the debug logs.
//!
//! Transport failures are not retried within a turn. Each failure class
//! maps to one fixed apology string and the user decides whether to
//! re-send.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info_span, warn, Instrument};

use crate::error::{ProviderError, Result, ShipmateError};
use crate::orders::CustomerContext;
use crate::providers::{ChatOptions, LLMProvider};
use crate::session::{
    ContentBlock, Message, SessionRegistry, KEEP_RECENT_TURNS, SUMMARIZE_THRESHOLD_TOKENS,
};
use crate::tools::tool_schemas;

use super::events::ChatEvent;

/// Upper bound on one model call.
const MODEL_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Drives chat turns for sessions in a registry.
pub struct AgentLoop {
    provider: Arc<dyn LLMProvider>,
    registry: Arc<SessionRegistry>,
    options: ChatOptions,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn LLMProvider>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            provider,
            registry,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one user turn and return the assistant's answer.
    ///
    /// Always returns a string: transport failures come back as fixed
    /// apology messages, anything else as a generic error line.
    pub async fn process_message(
        &self,
        session_key: &str,
        user_message: &str,
        events: Option<&mpsc::Sender<ChatEvent>>,
    ) -> String {
        let span = info_span!("chat_turn", session = session_key);
        let result = self
            .run_turn(session_key, user_message, events)
            .instrument(span)
            .await;

        match result {
            Ok(text) => {
                emit(events, ChatEvent::Complete { text: text.clone() }).await;
                text
            }
            Err(err) => {
                warn!(session = session_key, %err, "turn failed");
                let message = match &err {
                    ShipmateError::Provider(provider_err) => transport_apology(provider_err),
                    other => format!(
                        "An unexpected error occurred: {}. Please try again.",
                        other
                    ),
                };
                emit(
                    events,
                    ChatEvent::Error {
                        message: message.clone(),
                    },
                )
                .await;
                message
            }
        }
    }

    async fn run_turn(
        &self,
        session_key: &str,
        user_message: &str,
        events: Option<&mpsc::Sender<ChatEvent>>,
    ) -> Result<String> {
        let session = self.registry.get_or_create(session_key).await?;
        let mut session = session.lock().await;
        let session = &mut *session;

        let system = system_prompt(session.executor.context());
        session.store.append(Message::user(user_message));

        // Collapse old turns before they outgrow the context budget.
        if session.store.estimated_tokens(&system) > SUMMARIZE_THRESHOLD_TOKENS {
            session.store.summarize(KEEP_RECENT_TURNS);
        }

        let tools = tool_schemas();
        let mut iteration: u32 = 0;

        let answer = loop {
            iteration += 1;
            debug!(iteration, "awaiting model");
            emit(
                events,
                ChatEvent::Status {
                    message: "Thinking...".to_string(),
                },
            )
            .await;

            let response = tokio::time::timeout(
                MODEL_CALL_TIMEOUT,
                self.provider
                    .chat(&system, session.store.get(None), &tools, &self.options),
            )
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "model call exceeded {}s",
                    MODEL_CALL_TIMEOUT.as_secs()
                ))
            })??;

            if !response.has_tool_calls() {
                let text = response.content.unwrap_or_default();
                session.store.append(Message::assistant(text.clone()));
                emit(events, ChatEvent::Chunk { text: text.clone() }).await;
                break text;
            }

            // Record the model's turn exactly as issued: optional text
            // plus its tool_use blocks.
            let mut blocks = Vec::new();
            if let Some(text) = &response.content {
                blocks.push(ContentBlock::text(text.clone()));
            }
            for call in &response.tool_calls {
                blocks.push(ContentBlock::tool_use(
                    call.id.clone(),
                    call.name.clone(),
                    call.input.clone(),
                ));
            }
            session.store.append(Message::assistant_blocks(blocks));

            // Execute never fails, so every call yields a result block
            // and the protocol stays well-formed.
            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                emit(
                    events,
                    ChatEvent::ToolStart {
                        tool: call.name.clone(),
                    },
                )
                .await;
                let output = session
                    .executor
                    .execute(&call.name, call.input.clone())
                    .await;
                emit(
                    events,
                    ChatEvent::ToolComplete {
                        tool: call.name.clone(),
                    },
                )
                .await;
                results.push(ContentBlock::tool_result(call.id.clone(), output));
            }
            session.store.append(Message::tool_results(results));
        };

        session.touch();
        if let Err(err) = self.registry.save(session).await {
            warn!(session = %session.key, %err, "failed to persist session");
        }
        Ok(answer)
    }
}

/// System prompt with the customer's store, plan, and usage injected.
fn system_prompt(context: &CustomerContext) -> String {
    format!(
        "You are a shipping assistant for {store_name}. You help the merchant manage their \
         shipping operations through natural conversation.\n\n\
         You have access to tools for:\n\
         - Viewing unfulfilled orders\n\
         - Getting shipping rates from multiple carriers\n\
         - Validating addresses\n\
         - Creating shipments and labels\n\
         - Tracking packages\n\
         - Bulk shipping operations\n\n\
         Guidelines:\n\
         - Always confirm before purchasing labels (spending money)\n\
         - Proactively validate addresses before shipping\n\
         - When showing rates, highlight the best value option\n\
         - For bulk operations, summarize what will happen and confirm\n\
         - If an address has issues, explain and suggest corrections\n\n\
         {context}",
        store_name = context.store_name,
        context = context.format_for_prompt()
    )
}

/// Map a transport failure to its fixed user-facing apology.
pub fn transport_apology(err: &ProviderError) -> String {
    match err {
        ProviderError::RateLimit(_) => {
            "I'm currently experiencing high demand. Please try again in a moment.".to_string()
        }
        ProviderError::Timeout(_) => {
            "The request timed out. Please try again with a simpler request.".to_string()
        }
        ProviderError::Connection(_) => {
            "I'm having trouble connecting to the AI service. Please check your connection."
                .to_string()
        }
        other => format!("I encountered an API error: {}. Please try again.", other),
    }
}

async fn emit(events: Option<&mpsc::Sender<ChatEvent>>, event: ChatEvent) {
    if let Some(tx) = events {
        // A closed receiver only means the caller stopped listening.
        let _ = tx.send(event).await;
    }
}

use std::sync::Arc;

use hail_llm::{ChatResponse, Message, MessagePart, Role, ToolCallingOracle};

use super::{Content, MixedContent, ProgressSink, TaskFailure};
use crate::tools::{ToolContext, ToolSet};

/// Drives the oracle through rounds of tool calls until it answers in text.
pub struct ToolLoop {
    oracle: Arc<dyn ToolCallingOracle>,
    instructions: String,
    max_iterations: usize,
    progress_message: String,
}

impl ToolLoop {
    pub fn new(
        oracle: Arc<dyn ToolCallingOracle>,
        instructions: impl Into<String>,
        progress_message: impl Into<String>,
    ) -> Self {
        Self {
            oracle,
            instructions: instructions.into(),
            max_iterations: 4,
            progress_message: progress_message.into(),
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Run one query to a final content.
    ///
    /// Progress is reported before the first oracle call and before every
    /// batch of tool executions.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` failure when the oracle fails or never produces
    /// a final answer within the iteration budget.
    pub async fn run(
        &self,
        query: &str,
        tools: &ToolSet,
        progress: &ProgressSink,
    ) -> Result<Content, TaskFailure> {
        let definitions = tools.definitions();
        let mut messages = vec![
            Message::text(Role::System, self.instructions.as_str()),
            Message::text(Role::User, query),
        ];

        progress.progress(self.progress_message.as_str());

        for iteration in 0..self.max_iterations {
            let response = self
                .oracle
                .chat_with_tools(&messages, &definitions)
                .await
                .map_err(|e| TaskFailure::internal(format!("Agent execution failed: {e}")))?;

            let (text, tool_calls) = match response {
                ChatResponse::Text(text) => return Ok(Content::Text(text)),
                ChatResponse::ToolUse { text, tool_calls } => (text, tool_calls),
            };

            tracing::debug!(
                iteration,
                oracle = self.oracle.name(),
                calls = tool_calls.len(),
                "executing tool calls"
            );
            progress.progress(self.progress_message.as_str());

            let mut assistant_parts = Vec::with_capacity(tool_calls.len() + 1);
            if let Some(t) = text.as_ref().filter(|t| !t.is_empty()) {
                assistant_parts.push(MessagePart::Text { text: t.clone() });
            }
            let mut result_parts = Vec::with_capacity(tool_calls.len());
            let mut direct: Option<Content> = None;

            for call in tool_calls {
                assistant_parts.push(MessagePart::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                });

                let mut ctx = ToolContext::default();
                match tools.execute(&call.name, call.input, &mut ctx).await {
                    Ok(output) => {
                        result_parts.push(MessagePart::ToolResult {
                            tool_use_id: call.id,
                            content: output.to_model_text(),
                            is_error: false,
                        });
                        if ctx.skip_summarization && direct.is_none() {
                            direct = Some(output);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                        result_parts.push(MessagePart::ToolResult {
                            tool_use_id: call.id,
                            content: e.to_string(),
                            is_error: true,
                        });
                    }
                }
            }

            if let Some(output) = direct {
                return Ok(match text.filter(|t| !t.trim().is_empty()) {
                    Some(text) => Content::Mixed(MixedContent {
                        text,
                        structured_data: serde_json::to_value(&output)
                            .unwrap_or(serde_json::Value::Null),
                    }),
                    None => output,
                });
            }

            messages.push(Message::from_parts(Role::Assistant, assistant_parts));
            messages.push(Message::from_parts(Role::User, result_parts));
        }

        Err(TaskFailure::internal(format!(
            "Agent execution failed: no final answer after {} tool rounds",
            self.max_iterations
        )))
    }
}

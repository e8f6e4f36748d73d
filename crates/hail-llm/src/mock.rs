//! Test-only scripted oracle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{ChatResponse, Message, OracleFuture, ToolCallingOracle, ToolDefinition};

/// Replays scripted responses in order and records every conversation it receives.
#[derive(Debug, Clone)]
pub struct MockOracle {
    responses: Arc<Mutex<VecDeque<ChatResponse>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
    pub default_response: String,
    pub fail_chat: bool,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            fail_chat: false,
        }
    }
}

impl MockOracle {
    #[must_use]
    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    /// Conversations passed to `chat_with_tools`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolCallingOracle for MockOracle {
    fn chat_with_tools<'a>(
        &'a self,
        messages: &'a [Message],
        _tools: &'a [ToolDefinition],
    ) -> OracleFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(messages.to_vec());
            if self.fail_chat {
                return Err(LlmError::Other("mock LLM error".into()));
            }
            let next = self.responses.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| ChatResponse::Text(self.default_response.clone())))
        })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[tokio::test]
    async fn replays_scripted_responses_then_default() {
        let mock = MockOracle::with_responses(vec![ChatResponse::Text("first".into())]);
        let msgs = vec![Message::text(Role::User, "hi")];
        assert_eq!(
            mock.chat_with_tools(&msgs, &[]).await.unwrap(),
            ChatResponse::Text("first".into())
        );
        assert_eq!(
            mock.chat_with_tools(&msgs, &[]).await.unwrap(),
            ChatResponse::Text("mock response".into())
        );
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn failing_mock_returns_error() {
        let mock = MockOracle::failing();
        assert!(mock.chat_with_tools(&[], &[]).await.is_err());
    }
}

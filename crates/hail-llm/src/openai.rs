use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{
    ChatResponse, Message, MessagePart, OracleFuture, Role, ToolCallingOracle, ToolDefinition,
    ToolUseRequest,
};

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// OpenAI-compatible `/chat/completions` backend with function calling.
#[derive(Clone)]
pub struct OpenAiOracle {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl fmt::Debug for OpenAiOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiOracle")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiOracle {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client: crate::http::build_client(timeout)?,
            api_key: api_key.into(),
            base_url,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    async fn send_tool_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        let api_messages = convert_messages(messages);
        let api_tools: Vec<OpenAiTool<'_>> = tools
            .iter()
            .map(|t| OpenAiTool {
                r#type: "function",
                function: OpenAiFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect();

        let body = ToolChatRequest {
            model: &self.model,
            messages: &api_messages,
            max_tokens: self.max_tokens,
            tools: &api_tools,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            tracing::error!("OpenAI API error {status}: {text}");
            return Err(LlmError::Status {
                provider: "openai",
                status: status.as_u16(),
            });
        }

        let resp: ToolChatResponse = serde_json::from_str(&text)?;
        parse_tool_response(resp)
    }
}

impl ToolCallingOracle for OpenAiOracle {
    fn chat_with_tools<'a>(
        &'a self,
        messages: &'a [Message],
        tools: &'a [ToolDefinition],
    ) -> OracleFuture<'a> {
        Box::pin(self.send_tool_request(messages, tools))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai"
    }
}

fn parse_tool_response(resp: ToolChatResponse) -> Result<ChatResponse, LlmError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse { provider: "openai" })?;

    let content = choice.message.content.unwrap_or_default();

    if let Some(tool_calls) = choice.message.tool_calls
        && !tool_calls.is_empty()
    {
        let text = if content.is_empty() {
            None
        } else {
            Some(content)
        };
        let calls = tool_calls
            .into_iter()
            .map(|tc| {
                let input = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));
                ToolUseRequest {
                    id: tc.id,
                    name: tc.function.name,
                    input,
                }
            })
            .collect();
        return Ok(ChatResponse::ToolUse {
            text,
            tool_calls: calls,
        });
    }

    Ok(ChatResponse::Text(content))
}

#[derive(Serialize)]
struct OpenAiTool<'a> {
    r#type: &'a str,
    function: OpenAiFunction<'a>,
}

#[derive(Serialize)]
struct OpenAiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ToolChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [OpenAiTool<'a>],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_tools(tools: &&[OpenAiTool<'_>]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCallOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiToolCallOut {
    id: String,
    r#type: &'static str,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize)]
struct ApiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct ToolChatResponse {
    choices: Vec<ToolChatChoice>,
}

#[derive(Deserialize)]
struct ToolChatChoice {
    message: ToolChatMessage,
}

#[derive(Deserialize)]
struct ToolChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiToolCallFunction,
}

#[derive(Deserialize)]
struct OpenAiToolCallFunction {
    name: String,
    arguments: String,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn convert_messages(messages: &[Message]) -> Vec<ApiMessage> {
    let mut result = Vec::new();

    for msg in messages {
        if !msg.has_tool_parts() {
            result.push(ApiMessage {
                role: role_str(msg.role),
                content: msg.text_content(),
                tool_calls: None,
                tool_call_id: None,
            });
            continue;
        }

        if msg.role == Role::Assistant {
            let tool_calls: Vec<ApiToolCallOut> = msg
                .parts
                .iter()
                .filter_map(|p| match p {
                    MessagePart::ToolUse { id, name, input } => Some(ApiToolCallOut {
                        id: id.clone(),
                        r#type: "function",
                        function: ApiFunctionCall {
                            name: name.clone(),
                            arguments: input.to_string(),
                        },
                    }),
                    _ => None,
                })
                .collect();

            result.push(ApiMessage {
                role: "assistant",
                content: msg.text_content(),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            });
        } else {
            // tool results travel as one `role: "tool"` message per call
            for part in &msg.parts {
                match part {
                    MessagePart::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } => result.push(ApiMessage {
                        role: "tool",
                        content: content.clone(),
                        tool_calls: None,
                        tool_call_id: Some(tool_use_id.clone()),
                    }),
                    MessagePart::Text { text } if !text.is_empty() => result.push(ApiMessage {
                        role: "user",
                        content: text.clone(),
                        tool_calls: None,
                        tool_call_id: None,
                    }),
                    _ => {}
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn greet_tool() -> ToolDefinition {
        ToolDefinition {
            name: "greet".into(),
            description: "Greet a person by name".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }),
        }
    }

    fn oracle(base_url: &str) -> OpenAiOracle {
        OpenAiOracle::new("sk-test", base_url, "gpt-4", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn trailing_slashes_trimmed_from_base_url() {
        let o = oracle("https://api.openai.com/v1//");
        assert_eq!(o.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn debug_redacts_api_key() {
        let o = oracle("http://localhost");
        let debug = format!("{o:?}");
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn convert_messages_maps_tool_parts() {
        let messages = vec![
            Message::text(Role::System, "be nice"),
            Message::from_parts(
                Role::Assistant,
                vec![MessagePart::ToolUse {
                    id: "call_1".into(),
                    name: "greet".into(),
                    input: serde_json::json!({"name": "John"}),
                }],
            ),
            Message::from_parts(
                Role::User,
                vec![MessagePart::ToolResult {
                    tool_use_id: "call_1".into(),
                    content: "Hello John!".into(),
                    is_error: false,
                }],
            ),
        ];
        let result = convert_messages(&messages);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].role, "system");
        assert_eq!(result[1].role, "assistant");
        let calls = result[1].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"name":"John"}"#);
        assert_eq!(result[2].role, "tool");
        assert_eq!(result[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn parse_response_with_null_content_and_tool_calls() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "greet", "arguments": "{\"name\":\"Maria\"}"}
                    }]
                }
            }]
        }"#;
        let resp: ToolChatResponse = serde_json::from_str(json).unwrap();
        match parse_tool_response(resp).unwrap() {
            ChatResponse::ToolUse { text, tool_calls } => {
                assert!(text.is_none());
                assert_eq!(tool_calls[0].name, "greet");
                assert_eq!(tool_calls[0].input["name"], "Maria");
            }
            ChatResponse::Text(_) => panic!("expected tool use"),
        }
    }

    #[test]
    fn parse_response_without_choices_is_empty_error() {
        let resp: ToolChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            parse_tool_response(resp),
            Err(LlmError::EmptyResponse { .. })
        ));
    }

    #[tokio::test]
    async fn chat_with_tools_sends_function_definitions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "tools": [{"type": "function", "function": {"name": "greet"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Hello there!"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let o = oracle(&server.uri());
        let messages = vec![Message::text(Role::User, "hi")];
        let resp = o.chat_with_tools(&messages, &[greet_tool()]).await.unwrap();
        assert_eq!(resp, ChatResponse::Text("Hello there!".into()));
    }

    #[tokio::test]
    async fn chat_with_tools_maps_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let o = oracle(&server.uri());
        let err = o
            .chat_with_tools(&[Message::text(Role::User, "hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited));
    }

    #[tokio::test]
    async fn chat_with_tools_maps_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let o = oracle(&server.uri());
        let err = o
            .chat_with_tools(&[Message::text(Role::User, "hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 500, .. }));
    }
}

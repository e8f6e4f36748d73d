//! Outbound calls from the Caller to the Greeter's `/process` endpoint.
//!
//! Every outcome, including transport failures, is rendered as a line of text
//! so the calling engine can report it verbatim.

use std::time::Duration;

use hail_core::config::PeerConfig;
use hail_core::engine::TaskFailure;
use hail_core::{ErrorKind, PeerClient, PeerFuture, Secret};
use serde_json::Value;

use crate::error::A2aError;
use crate::types::ProcessRequest;

pub const NOT_CONFIGURED: &str = "Error: AGENT_A_URL is not configured. Cannot call Agent A.";
pub const TIMED_OUT: &str = "Error: Timeout while calling Agent A. The agent might be unavailable.";

#[derive(Clone)]
pub struct RemoteAgentClient {
    client: reqwest::Client,
    target: String,
    token: Option<Secret>,
    timeout: Duration,
}

impl RemoteAgentClient {
    #[must_use]
    pub fn new(client: reqwest::Client, target: impl Into<String>) -> Self {
        Self {
            client,
            target: target.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Client for the peer described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `A2aError::Http` if the HTTP client cannot be constructed.
    pub fn from_config(config: &PeerConfig) -> Result<Self, A2aError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("hail/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client, config.url.clone())
            .with_token(config.auth_token.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<Secret>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask the agent at `target` to greet `name`, returning a report line.
    pub async fn call_peer(
        &self,
        target: &str,
        name: &str,
        session_id: &str,
        token: Option<&str>,
    ) -> String {
        self.exchange(target, name, session_id, token)
            .await
            .unwrap_or_else(|failure| failure.message)
    }

    /// Like [`call_peer`](Self::call_peer), keeping the failure kind of an unsuccessful call.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` failure for an empty target, `PeerTimeout` when the
    /// call times out, and `PeerTransport` for every other fault. The message is the
    /// report line shown to users.
    pub async fn exchange(
        &self,
        target: &str,
        name: &str,
        session_id: &str,
        token: Option<&str>,
    ) -> Result<String, TaskFailure> {
        let target = target.trim().trim_end_matches('/');
        if target.is_empty() {
            tracing::warn!("peer url is not configured");
            return Err(TaskFailure::new(ErrorKind::Configuration, NOT_CONFIGURED));
        }

        let body = ProcessRequest {
            query: format!("Please greet {name}"),
            session_id: Some(session_id.to_owned()),
        };
        let mut req = self
            .client
            .post(format!("{target}/process"))
            .timeout(self.timeout)
            .json(&body);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }

        let resp = req.send().await.map_err(|e| fault(&e))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "peer returned an error status");
            return Err(TaskFailure::new(
                ErrorKind::PeerTransport,
                format!("Error calling Agent A: HTTP {} - {text}", status.as_u16()),
            ));
        }

        let value = resp.json::<Value>().await.map_err(|e| fault(&e))?;
        Ok(render_reply(&value))
    }
}

impl PeerClient for RemoteAgentClient {
    fn request_greeting<'a>(&'a self, name: &'a str, session_id: &'a str) -> PeerFuture<'a> {
        Box::pin(async move {
            let token = self.token.as_ref().map(Secret::expose);
            self.exchange(&self.target, name, session_id, token).await
        })
    }
}

fn fault(e: &reqwest::Error) -> TaskFailure {
    if e.is_timeout() {
        tracing::warn!("peer call timed out");
        return TaskFailure::new(ErrorKind::PeerTimeout, TIMED_OUT);
    }
    tracing::warn!(error = %e, "peer call failed");
    TaskFailure::new(ErrorKind::PeerTransport, format!("Error calling Agent A: {e}"))
}

/// Strings are shown bare, everything else as compact JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_reply(value: &Value) -> String {
    let Some(obj) = value.as_object() else {
        return format!("Agent A responded: {}", display(value));
    };

    if obj.get("type").and_then(Value::as_str) == Some("form") {
        let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        return format!("Agent A sent a form:\n{pretty}");
    }
    if let Some(greeting) = obj.get("greeting") {
        let field = |key: &str| obj.get(key).map_or_else(String::new, display);
        return format!(
            "Agent A responded: {} (greeting_id: {}, status: {})",
            display(greeting),
            field("greeting_id"),
            field("status"),
        );
    }
    if let Some(v) = obj.get("content").or_else(|| obj.get("response")) {
        return format!("Agent A responded: {}", display(v));
    }
    format!("Agent A responded with: {value}")
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(target: &str) -> RemoteAgentClient {
        RemoteAgentClient::new(reqwest::Client::new(), target)
    }

    #[tokio::test]
    async fn empty_target_is_reported_without_a_call() {
        let failure = client("").request_greeting("John", "s").await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Configuration);
        assert_eq!(failure.message, NOT_CONFIGURED);
        let report = client("   ").call_peer("   ", "John", "s", None).await;
        assert_eq!(report, NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn sends_greet_query_with_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(body_json(serde_json::json!({
                "query": "Please greet John",
                "session_id": "sess-1"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"content": "Hello John!"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let target = format!("{}/", server.uri());
        let report = client(&target).request_greeting("John", "sess-1").await;
        assert_eq!(report.unwrap(), "Agent A responded: Hello John!");
    }

    #[tokio::test]
    async fn bearer_token_is_attached_when_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "hi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let report = client(&server.uri())
            .with_token(Some(Secret::new("s3cret")))
            .request_greeting("Ann", "s")
            .await;
        assert_eq!(report.unwrap(), "Agent A responded: hi");
    }

    #[tokio::test]
    async fn error_status_includes_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let failure = client(&server.uri())
            .request_greeting("John", "s")
            .await
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::PeerTransport);
        assert_eq!(failure.message, "Error calling Agent A: HTTP 500 - boom");
    }

    #[tokio::test]
    async fn slow_peer_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"content": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let report = client(&server.uri())
            .with_timeout(Duration::from_millis(50))
            .request_greeting("John", "s")
            .await
            .unwrap_err();
        assert_eq!(report.kind, ErrorKind::PeerTimeout);
        assert_eq!(report.message, TIMED_OUT);
    }

    #[tokio::test]
    async fn unreachable_peer_is_a_transport_error() {
        let report = client("http://127.0.0.1:1")
            .call_peer("http://127.0.0.1:1", "John", "s", None)
            .await;
        assert!(report.starts_with("Error calling Agent A: "), "{report}");
    }

    #[tokio::test]
    async fn unparsable_body_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let failure = client(&server.uri())
            .request_greeting("John", "s")
            .await
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::PeerTransport);
        assert!(failure.message.starts_with("Error calling Agent A: "));
    }

    #[test]
    fn renders_greeting_record() {
        let reply = serde_json::json!({
            "greeting_id": "g-1",
            "status": "delivered",
            "greeting": "Hi Bo! Great to see you.",
            "style": "casual"
        });
        assert_eq!(
            render_reply(&reply),
            "Agent A responded: Hi Bo! Great to see you. (greeting_id: g-1, status: delivered)"
        );
    }

    #[test]
    fn renders_form_pretty() {
        let reply = serde_json::json!({"type": "form", "form_data": {"name": "Alex"}});
        let text = render_reply(&reply);
        assert!(text.starts_with("Agent A sent a form:\n{\n"));
        assert!(text.contains("\"name\": \"Alex\""));
    }

    #[test]
    fn renders_other_shapes() {
        assert_eq!(
            render_reply(&serde_json::json!({"other": 1})),
            r#"Agent A responded with: {"other":1}"#
        );
        assert_eq!(
            render_reply(&serde_json::json!("plain")),
            "Agent A responded: plain"
        );
        assert_eq!(render_reply(&serde_json::json!(42)), "Agent A responded: 42");
    }
}

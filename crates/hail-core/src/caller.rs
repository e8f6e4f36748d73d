//! Caller agent engines: relay a greeting request to the peer Greeter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hail_llm::ToolCallingOracle;

use crate::engine::{
    Content, ProgressSink, Task, TaskFailure, TaskStream, TaskStreamEngine, ToolLoop, task_stream,
};
use crate::extract::{NameExtractor, PatternExtractor};
use crate::session::SessionStore;
use crate::tools::{CallGreeterTool, ToolSet};

pub const CALLER_PROGRESS: &str = "Calling the Greeter Agent...";

/// Name used when a request mentions nobody.
pub const DEFAULT_TARGET: &str = "Someone";

pub const CALLER_INSTRUCTIONS: &str = "\
You are a caller agent that demonstrates agent-to-agent (A2A) communication. Your job is to call \
the Greeter Agent (Agent A) when someone wants to greet a person.

When someone asks you to get a greeting for a person, use the `call_greeter_agent` tool.

1. Extract the person's name from the request.
2. Call `call_greeter_agent` with that name.
3. Report back the response from Agent A.
4. If there is an error, explain what went wrong.

Examples:
- \"Ask the greeter to say hello to John\" -> call_greeter_agent(\"John\")
- \"Get a greeting for Maria from the other agent\" -> call_greeter_agent(\"Maria\")
- \"Call the greeter agent to welcome Alex\" -> call_greeter_agent(\"Alex\")

Always make clear that you are demonstrating A2A communication and report the full response \
from Agent A.";

pub type PeerFuture<'a> = Pin<Box<dyn Future<Output = Result<String, TaskFailure>> + Send + 'a>>;

/// Outbound channel to the Greeter.
///
/// A failed call carries a non-`Internal` kind and a message fit to show the user.
pub trait PeerClient: Send + Sync {
    fn request_greeting<'a>(&'a self, name: &'a str, session_id: &'a str) -> PeerFuture<'a>;
}

#[must_use]
pub fn demonstration_report(report: &str) -> String {
    format!("Demonstrating A2A communication:\n{report}")
}

/// Deterministic Caller: extracts a name and forwards a fixed query.
#[derive(Clone)]
pub struct PatternCaller {
    sessions: SessionStore,
    peer: Arc<dyn PeerClient>,
    extractor: Arc<dyn NameExtractor>,
}

impl PatternCaller {
    #[must_use]
    pub fn new(sessions: SessionStore, peer: Arc<dyn PeerClient>) -> Self {
        Self {
            sessions,
            peer,
            extractor: Arc::new(PatternExtractor),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn NameExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn answer(
        &self,
        query: &str,
        session_id: &str,
        progress: &ProgressSink,
    ) -> Result<Content, TaskFailure> {
        self.sessions.get_or_create(session_id).await;
        let name = self
            .extractor
            .extract(query)
            .unwrap_or_else(|| DEFAULT_TARGET.to_owned());

        progress.progress(CALLER_PROGRESS);
        tracing::info!(target_name = %name, "calling greeter");
        match self.peer.request_greeting(&name, session_id).await {
            Ok(report) => Ok(Content::Text(demonstration_report(&report))),
            Err(failure) => Err(TaskFailure::new(
                failure.kind,
                demonstration_report(&failure.message),
            )),
        }
    }
}

impl TaskStreamEngine for PatternCaller {
    fn run(&self, query: &str, session_id: &str) -> TaskStream {
        let this = self.clone();
        let task = Task::new(query, session_id);
        let (query, session_id) = (query.to_owned(), session_id.to_owned());
        task_stream(task, move |progress| async move {
            this.answer(&query, &session_id, &progress).await
        })
    }
}

/// Caller backed by a tool-calling oracle.
#[derive(Clone)]
pub struct OracleCaller {
    oracle: Arc<dyn ToolCallingOracle>,
    sessions: SessionStore,
    peer: Arc<dyn PeerClient>,
    max_iterations: usize,
}

impl OracleCaller {
    #[must_use]
    pub fn new(
        oracle: Arc<dyn ToolCallingOracle>,
        sessions: SessionStore,
        peer: Arc<dyn PeerClient>,
    ) -> Self {
        Self {
            oracle,
            sessions,
            peer,
            max_iterations: 4,
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    async fn answer(
        &self,
        query: &str,
        session_id: &str,
        progress: &ProgressSink,
    ) -> Result<Content, TaskFailure> {
        self.sessions.get_or_create(session_id).await;
        let tools = ToolSet::new().with_tool(CallGreeterTool::new(self.peer.clone(), session_id));
        ToolLoop::new(self.oracle.clone(), CALLER_INSTRUCTIONS, CALLER_PROGRESS)
            .with_max_iterations(self.max_iterations)
            .run(query, &tools, progress)
            .await
    }
}

impl TaskStreamEngine for OracleCaller {
    fn run(&self, query: &str, session_id: &str) -> TaskStream {
        let this = self.clone();
        let task = Task::new(query, session_id);
        let (query, session_id) = (query.to_owned(), session_id.to_owned());
        task_stream(task, move |progress| async move {
            this.answer(&query, &session_id, &progress).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::StreamExt;
    use hail_llm::mock::MockOracle;
    use hail_llm::{ChatResponse, ToolUseRequest};

    use super::*;
    use crate::engine::{ErrorKind, TaskEvent, final_event};

    /// Records requests and answers with a canned report.
    #[derive(Default)]
    struct RecordingPeer {
        requests: Mutex<Vec<(String, String)>>,
    }

    impl PeerClient for RecordingPeer {
        fn request_greeting<'a>(&'a self, name: &'a str, session_id: &'a str) -> PeerFuture<'a> {
            self.requests
                .lock()
                .unwrap()
                .push((name.to_owned(), session_id.to_owned()));
            let report = format!("Agent A responded: Hello {name}!");
            Box::pin(async move { Ok(report) })
        }
    }

    struct UnreachablePeer;

    impl PeerClient for UnreachablePeer {
        fn request_greeting<'a>(&'a self, _name: &'a str, _session_id: &'a str) -> PeerFuture<'a> {
            Box::pin(async {
                Err(TaskFailure::new(
                    ErrorKind::PeerTimeout,
                    "Error: Timeout while calling Agent A. The agent might be unavailable.",
                ))
            })
        }
    }

    /// Always answers with a fixed name, whatever the query says.
    struct FixedExtractor;

    impl NameExtractor for FixedExtractor {
        fn extract(&self, _text: &str) -> Option<String> {
            Some("Grace".into())
        }
    }

    #[tokio::test]
    async fn forwards_extracted_name_with_own_session() {
        let peer = Arc::new(RecordingPeer::default());
        let caller = PatternCaller::new(SessionStore::new(), peer.clone());
        let events: Vec<_> = caller
            .run("Ask the greeter to say hello to John", "sess-9")
            .collect()
            .await;

        assert_eq!(
            events[0],
            TaskEvent::Progress {
                message: CALLER_PROGRESS.into()
            }
        );
        assert_eq!(
            events[1],
            TaskEvent::Complete {
                content: Content::text(
                    "Demonstrating A2A communication:\nAgent A responded: Hello John!"
                )
            }
        );
        assert_eq!(
            *peer.requests.lock().unwrap(),
            vec![("John".to_owned(), "sess-9".to_owned())]
        );
    }

    #[tokio::test]
    async fn peer_failure_completes_with_diagnostic_text() {
        let caller = PatternCaller::new(SessionStore::new(), Arc::new(UnreachablePeer));
        let event = final_event(caller.run("greet Ann", "s")).await;
        assert_eq!(
            event,
            Some(TaskEvent::Complete {
                content: Content::text(
                    "Demonstrating A2A communication:\nError: Timeout while calling Agent A. \
                     The agent might be unavailable."
                )
            })
        );
    }

    #[tokio::test]
    async fn custom_extractor_decides_the_target() {
        let peer = Arc::new(RecordingPeer::default());
        let caller = PatternCaller::new(SessionStore::new(), peer.clone())
            .with_extractor(Arc::new(FixedExtractor));
        final_event(caller.run("say hello to John", "s")).await;
        assert_eq!(peer.requests.lock().unwrap()[0].0, "Grace");
    }

    #[tokio::test]
    async fn unknown_target_defaults_to_someone() {
        let peer = Arc::new(RecordingPeer::default());
        let caller = PatternCaller::new(SessionStore::new(), peer.clone());
        final_event(caller.run("do the thing", "s")).await;
        assert_eq!(peer.requests.lock().unwrap()[0].0, "Someone");
    }

    #[tokio::test]
    async fn creates_session_on_first_use() {
        let sessions = SessionStore::new();
        let caller = PatternCaller::new(sessions.clone(), Arc::new(RecordingPeer::default()));
        final_event(caller.run("greet Ann", "new-session")).await;
        assert!(sessions.get("new-session").await.is_some());
    }

    #[tokio::test]
    async fn oracle_caller_invokes_peer_through_tool() {
        let peer = Arc::new(RecordingPeer::default());
        let mock = MockOracle::with_responses(vec![
            ChatResponse::ToolUse {
                text: None,
                tool_calls: vec![ToolUseRequest {
                    id: "c1".into(),
                    name: "call_greeter_agent".into(),
                    input: serde_json::json!({"name": "Maria"}),
                }],
            },
            ChatResponse::Text("Demonstrating A2A communication: Agent A said hello.".into()),
        ]);
        let caller = OracleCaller::new(Arc::new(mock), SessionStore::new(), peer.clone());
        let event = final_event(caller.run("Get a greeting for Maria", "s2")).await;
        assert_eq!(
            event,
            Some(TaskEvent::Complete {
                content: Content::text("Demonstrating A2A communication: Agent A said hello.")
            })
        );
        assert_eq!(
            *peer.requests.lock().unwrap(),
            vec![("Maria".to_owned(), "s2".to_owned())]
        );
    }
}

//! Task lifecycle shared by every agent: one query in, an ordered event stream out.

mod stream;
mod tool_loop;

pub use stream::{ProgressSink, TaskStream, final_event, task_stream};
pub use tool_loop::ToolLoop;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::form::{FormDescriptor, GreetingResult};

/// Turns a query into a lazy, single-pass stream of [`TaskEvent`]s.
///
/// Every stream yields zero or more `Progress` events followed by exactly
/// one terminal `Complete` or `Error`.
pub trait TaskStreamEngine: Send + Sync {
    fn run(&self, query: &str, session_id: &str) -> TaskStream;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    PeerTimeout,
    PeerTransport,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::PeerTimeout => "peer_timeout",
            Self::PeerTransport => "peer_transport",
            Self::Internal => "internal",
        })
    }
}

/// Failure raised by a task body. Only `Internal` reaches the transport as an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TaskFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Model text accompanied by the structured output of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedContent {
    pub text: String,
    #[serde(rename = "structuredData")]
    pub structured_data: serde_json::Value,
}

/// Payload of a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Form(FormDescriptor),
    Greeting(GreetingResult),
    Mixed(MixedContent),
    Text(String),
}

impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Text for feeding back to a model: plain text verbatim, structured content as JSON.
    #[must_use]
    pub fn to_model_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    Progress { message: String },
    Complete { content: Content },
    Error { kind: ErrorKind, message: String },
}

impl TaskEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Complete,
    Failed,
}

/// One query's lifecycle. Never reused across queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub session_id: String,
    pub query: String,
    pub status: TaskStatus,
}

impl Task {
    #[must_use]
    pub fn new(query: &str, session_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_owned(),
            query: query.to_owned(),
            status: TaskStatus::Pending,
        }
    }
}

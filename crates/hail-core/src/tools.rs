//! Tools exposed to the completion engine by oracle-backed agents.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hail_llm::ToolDefinition;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::caller::PeerClient;
use crate::engine::Content;
use crate::form::FormRegistry;
use crate::greeting::{self, GreetingStyle};

/// Per-invocation state a tool may set to steer the surrounding loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolContext {
    /// Return this tool's output to the client as-is instead of letting the model summarize it.
    pub skip_summarization: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("invalid tool parameters: {message}")]
    InvalidParams { message: String },
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Content, ToolError>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct ToolDef {
    pub id: &'static str,
    pub description: &'static str,
    pub schema: schemars::Schema,
}

impl From<&ToolDef> for ToolDefinition {
    fn from(def: &ToolDef) -> Self {
        Self {
            name: def.id.to_owned(),
            description: def.description.to_owned(),
            parameters: def.schema.clone().to_value(),
        }
    }
}

pub trait AgentTool: Send + Sync {
    fn definition(&self) -> ToolDef;

    fn call<'a>(&'a self, input: serde_json::Value, ctx: &'a mut ToolContext) -> ToolFuture<'a>;
}

/// Deserialize tool input into a typed parameter struct.
///
/// # Errors
///
/// Returns `ToolError::InvalidParams` when deserialization fails.
pub fn deserialize_params<T: serde::de::DeserializeOwned>(
    input: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidParams {
        message: e.to_string(),
    })
}

/// Ordered collection of tools offered to the oracle for one task.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn AgentTool>>,
}

impl ToolSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tool(mut self, tool: impl AgentTool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::from(&t.definition()))
            .collect()
    }

    /// # Errors
    ///
    /// Returns `ToolError::Unknown` for an unregistered name, or the tool's own error.
    pub async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
        ctx: &mut ToolContext,
    ) -> Result<Content, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition().id == name)
            .ok_or_else(|| ToolError::Unknown(name.to_owned()))?;
        tool.call(input, ctx).await
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GreetParams {
    /// The name of the person to greet.
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateGreetingFormParams {
    /// Name of the person to greet, if already known.
    #[serde(default)]
    pub name: Option<String>,
    /// Preferred style: formal, casual or fun.
    #[serde(default)]
    pub style: Option<String>,
    /// Optional personal message to append.
    #[serde(default)]
    pub message: Option<String>,
    /// Guidance shown to the user alongside the form.
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CallGreeterParams {
    /// The name of the person the Greeter should greet.
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreetTool;

impl AgentTool for GreetTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            id: "greet",
            description: "Greet a person by name with a friendly message.",
            schema: schemars::schema_for!(GreetParams),
        }
    }

    fn call<'a>(&'a self, input: serde_json::Value, _ctx: &'a mut ToolContext) -> ToolFuture<'a> {
        Box::pin(async move {
            let params: GreetParams = deserialize_params(input)?;
            Ok(Content::Text(greeting::greet(params.name.trim())))
        })
    }
}

/// Creates a pending form and hands its descriptor straight back to the client.
#[derive(Clone)]
pub struct CreateGreetingFormTool {
    forms: FormRegistry,
}

impl CreateGreetingFormTool {
    #[must_use]
    pub fn new(forms: FormRegistry) -> Self {
        Self { forms }
    }
}

impl AgentTool for CreateGreetingFormTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            id: "create_greeting_form",
            description: "Create a form the user fills in to customize a greeting \
                (name, style and an optional message).",
            schema: schemars::schema_for!(CreateGreetingFormParams),
        }
    }

    fn call<'a>(&'a self, input: serde_json::Value, ctx: &'a mut ToolContext) -> ToolFuture<'a> {
        Box::pin(async move {
            let params: CreateGreetingFormParams = deserialize_params(input)?;
            let style = params.style.as_deref().map(GreetingStyle::parse_lenient);
            let form = self
                .forms
                .create_form(params.name, style, params.message)
                .await;
            ctx.skip_summarization = true;
            Ok(Content::Form(form.describe(params.instructions.as_deref())))
        })
    }
}

/// Asks the peer Greeter for a greeting within the current session.
#[derive(Clone)]
pub struct CallGreeterTool {
    peer: Arc<dyn PeerClient>,
    session_id: String,
}

impl CallGreeterTool {
    #[must_use]
    pub fn new(peer: Arc<dyn PeerClient>, session_id: impl Into<String>) -> Self {
        Self {
            peer,
            session_id: session_id.into(),
        }
    }
}

impl AgentTool for CallGreeterTool {
    fn definition(&self) -> ToolDef {
        ToolDef {
            id: "call_greeter_agent",
            description: "Call Agent A (Greeter Agent) to get a greeting for someone.",
            schema: schemars::schema_for!(CallGreeterParams),
        }
    }

    fn call<'a>(&'a self, input: serde_json::Value, _ctx: &'a mut ToolContext) -> ToolFuture<'a> {
        Box::pin(async move {
            let params: CallGreeterParams = deserialize_params(input)?;
            let report = self
                .peer
                .request_greeting(params.name.trim(), &self.session_id)
                .await
                .unwrap_or_else(|failure| {
                    tracing::warn!(kind = %failure.kind, "greeter call failed");
                    failure.message
                });
            Ok(Content::Text(report))
        })
    }
}

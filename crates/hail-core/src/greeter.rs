//! Greeter agent engines.

use std::sync::Arc;

use hail_llm::ToolCallingOracle;

use crate::engine::{
    Content, ProgressSink, Task, TaskFailure, TaskStream, TaskStreamEngine, ToolLoop, task_stream,
};
use crate::extract::{NameExtractor, PatternExtractor};
use crate::form::{FormRegistry, FormSubmission};
use crate::greeting::{self, DEFAULT_NAME, GreetingStyle};
use crate::session::SessionStore;
use crate::tools::{CreateGreetingFormTool, GreetTool, ToolSet};

pub const GREETER_PROGRESS: &str = "Preparing a friendly greeting...";

pub const GREETER_INSTRUCTIONS: &str = "\
You are a friendly greeting agent. Your job is to greet people warmly and make them feel welcome.

When someone asks you to greet a person, use the `greet` tool to generate a personalized greeting.
When someone asks for a custom or personalized greeting, use the `create_greeting_form` tool so \
they can choose the name, style and message.

1. Extract the person's name from the request.
2. Call `greet` with that name.
3. You may add friendly commentary around the greeting.
4. Always be warm, welcoming and positive.

Examples:
- \"Please greet John\" -> greet(\"John\")
- \"Say hello to Maria\" -> greet(\"Maria\")
- \"Welcome our guest Alex\" -> greet(\"Alex\")";

/// Whether a query asks for a customizable greeting rather than a plain one.
#[must_use]
pub fn wants_form(query: &str) -> bool {
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_ascii_lowercase)
        .any(|w| FORM_TRIGGERS.contains(&w.as_str()))
}

/// Whole words that ask for a customizable greeting.
const FORM_TRIGGERS: &[&str] = &[
    "form",
    "forms",
    "custom",
    "customize",
    "customized",
    "customizes",
    "customise",
    "customised",
    "customises",
    "customization",
    "customisation",
    "personalize",
    "personalized",
    "personalizes",
    "personalization",
    "personalise",
    "personalised",
    "personalises",
    "personalisation",
];

async fn resolve_submission(forms: &FormRegistry, query: &str) -> Option<Content> {
    let submission = FormSubmission::parse(query)?;
    tracing::info!(form_id = %submission.greeting_id, "resolving greeting form");
    Some(Content::Greeting(forms.submit(submission).await))
}

/// Deterministic Greeter: phrase extraction plus fixed templates.
#[derive(Clone)]
pub struct PatternGreeter {
    sessions: SessionStore,
    forms: FormRegistry,
    extractor: Arc<dyn NameExtractor>,
}

impl PatternGreeter {
    #[must_use]
    pub fn new(sessions: SessionStore, forms: FormRegistry) -> Self {
        Self {
            sessions,
            forms,
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
        progress.progress(GREETER_PROGRESS);

        if let Some(content) = resolve_submission(&self.forms, query).await {
            return Ok(content);
        }

        let name = self.extractor.extract(query);

        if wants_form(query) {
            let form = self
                .forms
                .create_form(name, GreetingStyle::find_in(query), None)
                .await;
            return Ok(Content::Form(form.describe(None)));
        }

        let name = name.unwrap_or_else(|| DEFAULT_NAME.to_owned());
        self.sessions
            .set_state(session_id, "last_greeted", serde_json::json!(name))
            .await;
        Ok(Content::Text(greeting::greet(&name)))
    }
}

impl TaskStreamEngine for PatternGreeter {
    fn run(&self, query: &str, session_id: &str) -> TaskStream {
        let this = self.clone();
        let task = Task::new(query, session_id);
        let (query, session_id) = (query.to_owned(), session_id.to_owned());
        task_stream(task, move |progress| async move {
            this.answer(&query, &session_id, &progress).await
        })
    }
}

/// Greeter backed by a tool-calling oracle.
#[derive(Clone)]
pub struct OracleGreeter {
    oracle: Arc<dyn ToolCallingOracle>,
    sessions: SessionStore,
    forms: FormRegistry,
    max_iterations: usize,
}

impl OracleGreeter {
    #[must_use]
    pub fn new(
        oracle: Arc<dyn ToolCallingOracle>,
        sessions: SessionStore,
        forms: FormRegistry,
    ) -> Self {
        Self {
            oracle,
            sessions,
            forms,
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

        if let Some(content) = resolve_submission(&self.forms, query).await {
            progress.progress(GREETER_PROGRESS);
            return Ok(content);
        }

        let tools = ToolSet::new()
            .with_tool(GreetTool)
            .with_tool(CreateGreetingFormTool::new(self.forms.clone()));
        ToolLoop::new(self.oracle.clone(), GREETER_INSTRUCTIONS, GREETER_PROGRESS)
            .with_max_iterations(self.max_iterations)
            .run(query, &tools, progress)
            .await
    }
}

impl TaskStreamEngine for OracleGreeter {
    fn run(&self, query: &str, session_id: &str) -> TaskStream {
        let this = self.clone();
        let task = Task::new(query, session_id);
        let (query, session_id) = (query.to_owned(), session_id.to_owned());
        task_stream(task, move |progress| async move {
            this.answer(&query, &session_id, &progress).await
        })
    }
}

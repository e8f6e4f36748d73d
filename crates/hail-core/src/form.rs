//! Pending greeting customization forms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};

use crate::greeting::{self, DEFAULT_NAME, GreetingStyle};

pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_INVALID_ID: &str = "Error: Invalid greeting_id.";

const DEFAULT_INSTRUCTIONS: &str = "Fill in the name and style (formal, casual or fun) for the \
    greeting, optionally add a personal message, then submit the form with its greeting_id.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingForm {
    pub form_id: String,
    pub name: Option<String>,
    pub style: Option<GreetingStyle>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GreetingForm {
    /// Schema-shaped descriptor a client can render and submit back.
    #[must_use]
    pub fn describe(&self, instructions: Option<&str>) -> FormDescriptor {
        FormDescriptor {
            kind: "form".into(),
            form: FormSchema::greeting(),
            form_data: FormData {
                greeting_id: self.form_id.clone(),
                name: self.name.clone().unwrap_or_else(|| "<name>".into()),
                style: self
                    .style
                    .map_or_else(|| "<casual>".into(), |s| s.as_str().to_owned()),
                message: self.message.clone().unwrap_or_else(|| "<message>".into()),
            },
            instructions: instructions
                .filter(|i| !i.trim().is_empty())
                .unwrap_or(DEFAULT_INSTRUCTIONS)
                .to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub form: FormSchema,
    pub form_data: FormData,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: FormProperties,
    pub required: Vec<String>,
}

impl FormSchema {
    fn greeting() -> Self {
        Self {
            kind: "object".into(),
            properties: FormProperties {
                name: FieldSchema::string("Name of the person to greet.", "Name"),
                style: FieldSchema::string(
                    "Greeting style: formal, casual or fun.",
                    "Greeting Style",
                ),
                message: FieldSchema::string(
                    "Optional personal message appended to the greeting.",
                    "Personal Message",
                ),
                greeting_id: FieldSchema::string(
                    "Identifier of this greeting form.",
                    "Greeting ID",
                ),
            },
            required: vec!["name".into(), "style".into(), "greeting_id".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormProperties {
    pub name: FieldSchema,
    pub style: FieldSchema,
    pub message: FieldSchema,
    pub greeting_id: FieldSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub title: String,
}

impl FieldSchema {
    fn string(description: &str, title: &str) -> Self {
        Self {
            kind: "string".into(),
            description: description.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    pub greeting_id: String,
    pub name: String,
    pub style: String,
    pub message: String,
}

/// Outcome of resolving a form. `greeting` and `style` are absent for an invalid id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreetingResult {
    pub greeting_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<GreetingStyle>,
}

impl GreetingResult {
    #[must_use]
    pub fn invalid(greeting_id: impl Into<String>) -> Self {
        Self {
            greeting_id: greeting_id.into(),
            status: STATUS_INVALID_ID.into(),
            greeting: None,
            style: None,
        }
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.status == STATUS_DELIVERED
    }
}

/// A completed form sent back by a client. `form_id` is accepted as an alias of `greeting_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub greeting_id: String,
    pub name: Option<String>,
    pub style: Option<String>,
    pub message: Option<String>,
}

impl FormSubmission {
    /// Recognize a query that is a JSON object carrying a form identifier.
    #[must_use]
    pub fn parse(query: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(query.trim()).ok()?;
        let obj = value.as_object()?;
        if !obj.contains_key("greeting_id") && !obj.contains_key("form_id") {
            return None;
        }
        let mut submission = Self {
            greeting_id: String::new(),
            name: None,
            style: None,
            message: None,
        };
        for (key, field) in obj {
            let text = match field {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            };
            match key.as_str() {
                "greeting_id" | "form_id" => {
                    if let Some(id) = text {
                        submission.greeting_id = id;
                    }
                }
                "name" => submission.name = filled(text),
                "style" => submission.style = filled(text),
                "message" => submission.message = filled(text),
                _ => {}
            }
        }
        Some(submission)
    }
}

/// Drops empty values and untouched `<placeholder>` sentinels.
fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && !(v.starts_with('<') && v.ends_with('>'))
    })
}

/// Process-wide store of pending forms; each id resolves exactly once.
#[derive(Clone, Default)]
pub struct FormRegistry {
    forms: Arc<RwLock<HashMap<String, GreetingForm>>>,
}

impl FormRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_form(
        &self,
        name: Option<String>,
        style: Option<GreetingStyle>,
        message: Option<String>,
    ) -> GreetingForm {
        let form = GreetingForm {
            form_id: uuid::Uuid::new_v4().to_string(),
            name: filled(name),
            style,
            message: filled(message),
            created_at: Utc::now(),
        };
        self.forms
            .write()
            .await
            .insert(form.form_id.clone(), form.clone());
        tracing::debug!(form_id = %form.form_id, "greeting form created");
        form
    }

    pub async fn get(&self, form_id: &str) -> Option<GreetingForm> {
        self.forms.read().await.get(form_id).cloned()
    }

    #[must_use]
    pub fn describe_form(form: &GreetingForm, instructions: Option<&str>) -> FormDescriptor {
        form.describe(instructions)
    }

    /// Resolve a form using its stored fields.
    pub async fn resolve(&self, form_id: &str) -> GreetingResult {
        self.submit(FormSubmission {
            greeting_id: form_id.to_owned(),
            name: None,
            style: None,
            message: None,
        })
        .await
    }

    /// Resolve a form, letting filled-in submission fields override stored ones.
    pub async fn submit(&self, submission: FormSubmission) -> GreetingResult {
        let Some(form) = self.forms.write().await.remove(&submission.greeting_id) else {
            tracing::warn!(form_id = %submission.greeting_id, "unknown greeting form");
            return GreetingResult::invalid(submission.greeting_id);
        };

        let name = filled(submission.name)
            .or(form.name)
            .unwrap_or_else(|| DEFAULT_NAME.to_owned());
        let style = filled(submission.style)
            .map(|s| GreetingStyle::parse_lenient(&s))
            .or(form.style)
            .unwrap_or_default();
        let message = filled(submission.message).or(form.message);

        tracing::debug!(form_id = %form.form_id, %style, "greeting form resolved");
        GreetingResult {
            greeting: Some(greeting::resolve(&name, style, message.as_deref())),
            greeting_id: form.form_id,
            status: STATUS_DELIVERED.into(),
            style: Some(style),
        }
    }

    /// Drop forms created more than `max_age` ago. Returns how many were removed.
    pub async fn evict_expired(&self, max_age: Duration) -> usize {
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return 0;
        };
        let cutoff = Utc::now() - max_age;
        let mut forms = self.forms.write().await;
        let before = forms.len();
        forms.retain(|_, f| f.created_at >= cutoff);
        before - forms.len()
    }

    /// Periodically expire unsubmitted forms until `shutdown` flips to `true`.
    pub fn spawn_expiry_sweeper(
        &self,
        max_age: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        let period = (max_age / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let expired = registry.evict_expired(max_age).await;
                        if expired > 0 {
                            tracing::info!(expired, "expired unsubmitted greeting forms");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.forms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.forms.read().await.is_empty()
    }
}

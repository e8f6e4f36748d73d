use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Self-description served at `/.well-known/agent.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub capabilities: AgentCapabilities,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_input_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_output_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<AgentSkill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Body of `POST /process` and `POST /process/stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ProcessRequest {
    /// The caller's session id, or a fresh one when absent or blank.
    #[must_use]
    pub fn session_id_or_new(&self) -> String {
        match self.session_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Presence of a configuration value, reported without exposing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecretHealth {
    Ok,
    Missing,
}

impl SecretHealth {
    #[must_use]
    pub fn of(value: Option<&str>) -> Self {
        if value.is_some_and(|v| !v.trim().is_empty()) {
            Self::Ok
        } else {
            Self::Missing
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub secrets_health: BTreeMap<String, SecretHealth>,
}

impl HealthResponse {
    /// Report for an agent named `agent_name`, e.g. `"Greeter Agent is running."`.
    #[must_use]
    pub fn running(agent_name: &str, secrets_health: BTreeMap<String, SecretHealth>) -> Self {
        Self {
            status: format!("{agent_name} is running."),
            secrets_health,
        }
    }
}

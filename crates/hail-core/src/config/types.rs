use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::secret::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    #[default]
    Greeter,
    Caller,
}

impl AgentRole {
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Greeter => "Greeter Agent",
            Self::Caller => "Caller Agent",
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Greeter => 8081,
            Self::Caller => 8082,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeter => "greeter",
            Self::Caller => "caller",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which engine implementation backs the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    #[default]
    Pattern,
    Oracle,
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "oracle" | "llm" => Ok(Self::Oracle),
            other => Err(format!("unknown engine mode: {other}")),
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pattern => "pattern",
            Self::Oracle => "oracle",
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub peer: PeerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub forms: FormConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub role: AgentRole,
    #[serde(default)]
    pub mode: EngineMode,
    /// Overrides the role's display name in health and agent card output.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Falls back to the role's default port when unset.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub public_url: String,
    #[serde(default = "default_max_body")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_max_body() -> usize {
    1_048_576
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            public_url: String::new(),
            max_body_size: default_max_body(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<Secret>,
    #[serde(default = "default_peer_timeout")]
    pub timeout_secs: u64,
}

fn default_peer_timeout() -> u64 {
    30
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth_token: None,
            timeout_secs: default_peer_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<Secret>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-4".into()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_max_tool_iterations() -> usize {
    4
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity before a session is evicted; `0` keeps sessions forever.
    #[serde(default)]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormConfig {
    /// Seconds an unsubmitted form stays resolvable; `0` keeps forms until submitted.
    #[serde(default)]
    pub ttl_secs: u64,
}

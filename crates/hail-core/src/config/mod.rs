mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Check settings that would make the agent unusable at runtime.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent.mode == EngineMode::Oracle
            && self.llm.api_key.as_ref().is_none_or(crate::Secret::is_empty)
        {
            bail!("oracle mode requires an API key (set OPENAI_API_KEY or llm.api_key)");
        }
        if self.llm.max_tool_iterations == 0 {
            bail!("llm.max_tool_iterations must be at least 1");
        }
        if self.peer.timeout_secs == 0 {
            bail!("peer.timeout_secs must be greater than zero");
        }
        if !self.peer.url.is_empty()
            && !(self.peer.url.starts_with("http://") || self.peer.url.starts_with("https://"))
        {
            bail!("peer.url must be an http(s) URL, got {}", self.peer.url);
        }
        if self.server.max_body_size == 0 {
            bail!("server.max_body_size must be greater than zero");
        }
        Ok(())
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.server
            .port
            .unwrap_or_else(|| self.agent.role.default_port())
    }

    #[must_use]
    pub fn agent_name(&self) -> &str {
        self.agent
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.agent.role.display_name())
    }

    /// URL advertised in the agent card.
    #[must_use]
    pub fn public_url(&self) -> String {
        if self.server.public_url.is_empty() {
            format!("http://localhost:{}", self.port())
        } else {
            self.server.public_url.clone()
        }
    }
}

/// Resolve the config path: explicit argument, then `HAIL_CONFIG`, then `config/<role>.toml`.
#[must_use]
pub fn resolve_config_path(cli_path: Option<&Path>, role: AgentRole) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("HAIL_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(format!("config/{role}.toml"))
}

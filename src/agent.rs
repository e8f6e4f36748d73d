//! Wiring from a loaded [`Config`] to the engine and health report an agent serves.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hail_a2a::card::card_for;
use hail_a2a::{AgentCard, HealthResponse, RemoteAgentClient, SecretHealth};
use hail_core::config::{AgentRole, Config, EngineMode};
use hail_core::form::FormRegistry;
use hail_core::session::SessionStore;
use hail_core::{
    OracleCaller, OracleGreeter, PatternCaller, PatternGreeter, Secret, TaskStreamEngine,
};
use hail_llm::ToolCallingOracle;
use hail_llm::openai::OpenAiOracle;

fn build_oracle(config: &Config) -> anyhow::Result<Arc<dyn ToolCallingOracle>> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .filter(|k| !k.is_empty())
        .context("oracle mode requires an API key")?;
    let oracle = OpenAiOracle::new(
        api_key.expose(),
        &config.llm.base_url,
        &config.llm.model,
        Duration::from_secs(config.llm.timeout_secs),
    )
    .context("failed to build completion client")?;
    tracing::info!(model = %config.llm.model, "using completion oracle");
    Ok(Arc::new(oracle))
}

/// Engine for the configured role and mode, sharing `sessions` with the server.
/// The Greeter keeps its pending forms in `forms`.
///
/// # Errors
///
/// Returns an error if an HTTP client for the oracle or the peer cannot be built.
pub fn build_engine(
    config: &Config,
    sessions: &SessionStore,
    forms: &FormRegistry,
) -> anyhow::Result<Arc<dyn TaskStreamEngine>> {
    let iterations = config.llm.max_tool_iterations;
    let engine: Arc<dyn TaskStreamEngine> = match config.agent.role {
        AgentRole::Greeter => {
            let forms = forms.clone();
            match config.agent.mode {
                EngineMode::Pattern => Arc::new(PatternGreeter::new(sessions.clone(), forms)),
                EngineMode::Oracle => Arc::new(
                    OracleGreeter::new(build_oracle(config)?, sessions.clone(), forms)
                        .with_max_iterations(iterations),
                ),
            }
        }
        AgentRole::Caller => {
            if config.peer.url.is_empty() {
                tracing::warn!("AGENT_A_URL is not set; greeting requests will report an error");
            }
            let peer = Arc::new(
                RemoteAgentClient::from_config(&config.peer)
                    .context("failed to build peer client")?,
            );
            match config.agent.mode {
                EngineMode::Pattern => Arc::new(PatternCaller::new(sessions.clone(), peer)),
                EngineMode::Oracle => Arc::new(
                    OracleCaller::new(build_oracle(config)?, sessions.clone(), peer)
                        .with_max_iterations(iterations),
                ),
            }
        }
    };
    Ok(engine)
}

#[must_use]
pub fn health_for(config: &Config) -> HealthResponse {
    let mut secrets = BTreeMap::new();
    match config.agent.role {
        AgentRole::Greeter => {
            let key = config.llm.api_key.as_ref().map(Secret::expose);
            secrets.insert("OPENAI_API_KEY".to_owned(), SecretHealth::of(key));
        }
        AgentRole::Caller => {
            secrets.insert(
                "AGENT_A_URL".to_owned(),
                SecretHealth::of(Some(config.peer.url.as_str())),
            );
        }
    }
    HealthResponse::running(config.agent_name(), secrets)
}

#[must_use]
pub fn card(config: &Config) -> AgentCard {
    card_for(config.agent.role, config.agent_name(), &config.public_url())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(role: AgentRole) -> Config {
        let mut config = Config::default();
        config.agent.role = role;
        config
    }

    #[test]
    fn greeter_health_checks_api_key() {
        let mut cfg = config(AgentRole::Greeter);
        let health = health_for(&cfg);
        assert_eq!(health.status, "Greeter Agent is running.");
        assert_eq!(health.secrets_health["OPENAI_API_KEY"], SecretHealth::Missing);

        cfg.llm.api_key = Some(Secret::new("sk-test"));
        assert_eq!(
            health_for(&cfg).secrets_health["OPENAI_API_KEY"],
            SecretHealth::Ok
        );
    }

    #[test]
    fn caller_health_checks_peer_url() {
        let mut cfg = config(AgentRole::Caller);
        assert_eq!(
            health_for(&cfg).secrets_health["AGENT_A_URL"],
            SecretHealth::Missing
        );
        cfg.peer.url = "http://localhost:8081".into();
        let health = health_for(&cfg);
        assert_eq!(health.status, "Caller Agent is running.");
        assert_eq!(health.secrets_health["AGENT_A_URL"], SecretHealth::Ok);
        assert!(!health.secrets_health.contains_key("OPENAI_API_KEY"));
    }

    #[test]
    fn card_uses_public_url_and_name_override() {
        let mut cfg = config(AgentRole::Caller);
        cfg.agent.name = Some("Relay".into());
        cfg.server.public_url = "https://relay.example".into();
        let card = card(&cfg);
        assert_eq!(card.name, "Relay");
        assert_eq!(card.url, "https://relay.example");
    }

    #[test]
    fn oracle_mode_without_key_fails_to_build() {
        let mut cfg = config(AgentRole::Greeter);
        cfg.agent.mode = EngineMode::Oracle;
        let err = build_engine(&cfg, &SessionStore::new(), &FormRegistry::new())
            .err()
            .expect("missing key must fail");
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn pattern_engines_build_without_credentials() {
        let sessions = SessionStore::new();
        let forms = FormRegistry::new();
        assert!(build_engine(&config(AgentRole::Greeter), &sessions, &forms).is_ok());
        assert!(build_engine(&config(AgentRole::Caller), &sessions, &forms).is_ok());
    }
}

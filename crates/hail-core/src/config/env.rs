use super::{Config, EngineMode};
use crate::secret::Secret;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_agent();
        self.apply_env_overrides_credentials();
    }

    fn apply_env_overrides_agent(&mut self) {
        if let Ok(v) = std::env::var("HAIL_AGENT_NAME") {
            self.agent.name = Some(v);
        }
        if let Ok(v) = std::env::var("HAIL_AGENT_MODE") {
            match v.parse::<EngineMode>() {
                Ok(mode) => self.agent.mode = mode,
                Err(e) => tracing::warn!("ignoring invalid HAIL_AGENT_MODE value: {e}"),
            }
        }
        if let Ok(v) = std::env::var("HAIL_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.port = Some(port);
            } else {
                tracing::warn!("ignoring invalid PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("PUBLIC_URL") {
            self.server.public_url = v;
        }
        if let Ok(v) = std::env::var("AGENT_A_URL") {
            self.peer.url = v.trim().trim_end_matches('/').to_owned();
        }
        if let Ok(v) = std::env::var("HAIL_PEER_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.peer.timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid HAIL_PEER_TIMEOUT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("HAIL_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("HAIL_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("HAIL_SESSION_IDLE_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.sessions.idle_timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid HAIL_SESSION_IDLE_TIMEOUT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("HAIL_FORM_TTL") {
            if let Ok(secs) = v.parse::<u64>() {
                self.forms.ttl_secs = secs;
            } else {
                tracing::warn!("ignoring invalid HAIL_FORM_TTL value: {v}");
            }
        }
    }

    fn apply_env_overrides_credentials(&mut self) {
        if let Ok(v) = std::env::var("OPENAI_API_KEY")
            && !v.trim().is_empty()
        {
            self.llm.api_key = Some(Secret::new(v));
        }
        if let Ok(v) = std::env::var("AGENT_A_TOKEN")
            && !v.trim().is_empty()
        {
            self.peer.auth_token = Some(Secret::new(v));
        }
    }
}

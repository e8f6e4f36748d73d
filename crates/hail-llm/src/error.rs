#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("{provider} API request failed (status {status})")]
    Status { provider: &'static str, status: u16 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = LlmError::Status {
            provider: "openai",
            status: 503,
        };
        assert_eq!(err.to_string(), "openai API request failed (status 503)");
    }

    #[test]
    fn empty_response_display() {
        let err = LlmError::EmptyResponse { provider: "mock" };
        assert_eq!(err.to_string(), "empty response from mock");
    }
}

//! Shared HTTP client construction for oracle backends.

use std::time::Duration;

/// Build the HTTP client used by oracle backends.
///
/// Config: 30s connect timeout, caller-supplied request timeout, rustls TLS,
/// `hail/{version}` user-agent, redirect limit 10.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .user_agent(concat!("hail/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

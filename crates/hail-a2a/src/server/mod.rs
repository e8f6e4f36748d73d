mod handlers;
mod router;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hail_core::TaskStreamEngine;
use hail_core::session::SessionStore;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::error::A2aError;
use crate::types::{AgentCard, HealthResponse};
pub use router::{DEFAULT_MAX_BODY_SIZE, build_router};
pub use state::AppState;

pub struct A2aServer {
    state: AppState,
    addr: SocketAddr,
    shutdown_rx: watch::Receiver<bool>,
    max_body_size: usize,
    idle_sweep: Option<(SessionStore, Duration)>,
}

impl A2aServer {
    #[must_use]
    pub fn new(
        card: AgentCard,
        engine: Arc<dyn TaskStreamEngine>,
        health: HealthResponse,
        host: &str,
        port: u16,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{host}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid host '{host}': {e}, falling back to 0.0.0.0:{port}");
            SocketAddr::from(([0, 0, 0, 0], port))
        });

        Self {
            state: AppState::new(card, engine, health),
            addr,
            shutdown_rx,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            idle_sweep: None,
        }
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Evict sessions idle for longer than `max_idle` while serving. Zero disables eviction.
    #[must_use]
    pub fn with_idle_sweep(mut self, sessions: SessionStore, max_idle: Duration) -> Self {
        self.idle_sweep = (!max_idle.is_zero()).then_some((sessions, max_idle));
        self
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the configured address and serve until the shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), A2aError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| A2aError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal I/O error while serving.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), A2aError> {
        let local = listener
            .local_addr()
            .map_err(|e| A2aError::Server(format!("listener has no local address: {e}")))?;
        let router = build_router(self.state, self.max_body_size);

        let sweeper = self.idle_sweep.map(|(sessions, max_idle)| {
            tracing::info!(idle_secs = max_idle.as_secs(), "session idle eviction enabled");
            sessions.spawn_idle_sweeper(max_idle, self.shutdown_rx.clone())
        });

        tracing::info!("agent server listening on {local}");

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("agent server shutting down");
            })
            .await
            .map_err(|e| A2aError::Server(format!("server error: {e}")))?;

        if let Some(handle) = sweeper {
            handle.abort();
        }
        Ok(())
    }
}

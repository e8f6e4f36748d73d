//! Agent-to-agent plumbing: agent cards, the outbound peer client and (with the
//! `server` feature) the HTTP transport that exposes a task stream engine.
#![forbid(unsafe_code)]

pub mod card;
pub mod client;
pub mod error;
#[cfg(feature = "server")]
pub mod server;
pub mod types;

pub use card::AgentCardBuilder;
pub use client::RemoteAgentClient;
pub use error::A2aError;
pub use types::*;

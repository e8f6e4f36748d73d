//! Tool-calling oracle abstraction and backend implementations.

pub mod error;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use error::LlmError;
pub use provider::{
    ChatResponse, Message, MessagePart, OracleFuture, Role, ToolCallingOracle, ToolDefinition,
    ToolUseRequest,
};

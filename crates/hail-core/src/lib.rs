//! Agent core: task stream engines, greeting logic, forms, sessions and configuration.

pub mod caller;
pub mod config;
pub mod engine;
pub mod extract;
pub mod form;
pub mod greeter;
pub mod greeting;
pub mod secret;
pub mod session;
pub mod tools;

pub use caller::{OracleCaller, PatternCaller, PeerClient, PeerFuture};
pub use config::Config;
pub use engine::{Content, ErrorKind, TaskEvent, TaskStream, TaskStreamEngine};
pub use greeter::{OracleGreeter, PatternGreeter};
pub use secret::Secret;

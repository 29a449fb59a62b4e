//! Core types shared by the whisprer crates: the session state machine,
//! the sink interface outcomes are delivered through, and configuration.

mod config;
mod sink;
mod state;

pub use config::{Config, ConfigManager};
pub use sink::{ErrorKind, SessionSink};
pub use state::SessionState;

pub const APP_NAME: &str = "whisprer";
pub const APP_NAME_PRETTY: &str = "Whisprer";
pub const DEFAULT_LOG_LEVEL: &str = "info";

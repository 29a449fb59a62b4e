// Re-export from sub-crates
pub use whisprer_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, DEFAULT_LOG_LEVEL, ErrorKind, SessionSink,
    SessionState,
};
pub use whisprer_audio::{Capture, CaptureError, CaptureSource, CaptureStats};
pub use whisprer_transcribe::{RemoteClient, RemoteConfig, TranscribeError, Transcriber};

// App-specific modules
pub mod config_ext;
pub mod event;
pub mod icon;
pub mod notify;
pub mod session;
pub mod sink;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Speech-to-text over the whisprer transcription service.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

mod remote;

pub use remote::{RemoteClient, RemoteConfig};

#[derive(Debug, Error)]
pub enum TranscribeError {
    /// No API key is configured; checked before any I/O happens.
    #[error("no API key configured")]
    MissingCredential,
    /// The request exceeded the client timeout.
    #[error("transcription request timed out")]
    Timeout,
    /// The service answered with a non-success status. The body is kept
    /// verbatim for diagnostics.
    #[error("transcription service returned {status}: {body}")]
    Service { status: u16, body: String },
    /// The response body did not match the expected shape.
    #[error("malformed transcription response: {0}")]
    MalformedResponse(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Reading the audio file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TranscribeError>;

/// A service that turns an audio file into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `audio`.
    async fn transcribe(&self, audio: &Path) -> Result<String>;

    /// Short name for logging.
    fn name(&self) -> &str;
}

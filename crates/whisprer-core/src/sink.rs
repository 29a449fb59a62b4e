use std::fmt;

use crate::SessionState;

/// Category attached to every error delivered to sinks, so a sink can
/// decide how to render a failure without parsing the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No input device supports the capture format.
    NoInputDevice,
    /// Capture failed after a device was acquired.
    CaptureIo,
    /// No API key is configured.
    MissingCredential,
    /// The transcription request exceeded its deadline.
    TranscriptionTimeout,
    /// The transcription service was unreachable or returned an error.
    TranscriptionService,
    /// The transcription response did not match the expected shape.
    MalformedResponse,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoInputDevice => "no-input-device",
            Self::CaptureIo => "capture-io",
            Self::MissingCredential => "missing-credential",
            Self::TranscriptionTimeout => "transcription-timeout",
            Self::TranscriptionService => "transcription-service",
            Self::MalformedResponse => "malformed-response",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives session outcomes.
///
/// The session coordinator fans every outcome out to all attached sinks
/// and never assumes a UI exists. Implementations render what they care
/// about and inherit no-ops for the rest; a call must not block for long,
/// since sinks run on the session worker thread.
pub trait SessionSink: Send + Sync {
    /// The session moved to a new state.
    fn on_state_changed(&self, _state: SessionState) {}

    /// A transcription finished successfully.
    fn on_transcript(&self, _text: &str) {}

    /// A capture or transcription failed. The message is the error's
    /// display text.
    fn on_error(&self, _kind: ErrorKind, _message: &str) {}

    /// A non-error notice the user should see, such as a toggle being
    /// rejected while a transcription is in flight.
    fn on_status(&self, _message: &str) {}
}

use std::fmt;

/// The recording/transcription session state machine.
///
/// Exactly one session exists per process, and every trigger (hotkey, tray
/// menu) drives the same instance. A toggle starts capture from [`Idle`],
/// stops it from [`Recording`], and is rejected while [`Transcribing`].
///
/// [`Idle`]: SessionState::Idle
/// [`Recording`]: SessionState::Recording
/// [`Transcribing`]: SessionState::Transcribing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No capture or transcription in progress.
    #[default]
    Idle,
    /// The microphone is live and audio is accumulating.
    Recording,
    /// A capture finished and its transcription request is in flight.
    Transcribing,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Transcribing => "transcribing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

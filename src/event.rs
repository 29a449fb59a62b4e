//! Application events for the tao event loop.

use crate::SessionState;

/// Events delivered to the UI thread through the event loop proxy.
///
/// Session errors are not forwarded here; they surface as toasts through
/// the notification layer when the console sink logs them.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The session state has changed
    StateChanged(SessionState),
    /// A transcription is ready
    TranscriptReady(String),
    /// A notice the user should see, such as a rejected toggle
    Status(String),
}

//! The result sinks attached to the session.
//!
//! Each sink renders one delivery surface: the console log, the system
//! clipboard, and the tao event loop feeding the tray adapter.

use arboard::Clipboard;
use parking_lot::Mutex;
use tao::event_loop::EventLoopProxy;
use tracing::{error, info, warn};

use crate::event::AppEvent;
use crate::{ErrorKind, SessionSink, SessionState};

/// Logs every session outcome; the headless delivery surface.
pub struct ConsoleSink;

impl SessionSink for ConsoleSink {
    fn on_state_changed(&self, state: SessionState) {
        info!(state = %state, "session state changed");
    }

    fn on_transcript(&self, text: &str) {
        info!("transcript: {text}");
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        error!(kind = kind.as_str(), "{message}");
    }

    fn on_status(&self, message: &str) {
        info!("{message}");
    }
}

/// Copies each transcript to the system clipboard.
pub struct ClipboardSink {
    clipboard: Mutex<Clipboard>,
}

impl ClipboardSink {
    pub fn new() -> Result<Self, arboard::Error> {
        Ok(Self {
            clipboard: Mutex::new(Clipboard::new()?),
        })
    }
}

impl SessionSink for ClipboardSink {
    fn on_transcript(&self, text: &str) {
        if let Err(e) = self.clipboard.lock().set_text(text) {
            warn!("Failed to copy transcript to clipboard: {e}");
        }
    }
}

/// Forwards session outcomes to the event loop for the tray adapter.
pub struct EventLoopSink {
    // The proxy is Send but not guaranteed Sync on every platform.
    proxy: Mutex<EventLoopProxy<AppEvent>>,
}

impl EventLoopSink {
    pub fn new(proxy: EventLoopProxy<AppEvent>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }

    fn send(&self, event: AppEvent) {
        // Fails only when the event loop is gone, at which point there is
        // nothing left to render to.
        self.proxy.lock().send_event(event).ok();
    }
}

impl SessionSink for EventLoopSink {
    fn on_state_changed(&self, state: SessionState) {
        self.send(AppEvent::StateChanged(state));
    }

    fn on_transcript(&self, text: &str) {
        self.send(AppEvent::TranscriptReady(text.to_owned()));
    }

    fn on_status(&self, message: &str) {
        self.send(AppEvent::Status(message.to_owned()));
    }
}

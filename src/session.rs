//! The recording/transcription session.
//!
//! Every trigger (hotkey, tray menu) and every transcription completion
//! funnels into one command queue consumed by a dedicated worker thread,
//! so state transitions stay serialized no matter which source fired.
//! The worker also owns the capture, whose cpal stream is not `Send`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use parking_lot::Mutex;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info, warn};

use crate::{
    Capture, CaptureError, CaptureSource, ErrorKind, SessionSink, SessionState, TranscribeError,
    Transcriber,
};

/// Grace given to an in-flight transcription when the app exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

enum Command {
    Toggle,
    JobDone {
        audio: PathBuf,
        result: Result<String, TranscribeError>,
    },
    Shutdown,
}

/// Owns the session worker thread and the transcription runtime.
///
/// [`toggle`] may be called from any thread; commands are queued and
/// processed in order on the worker.
///
/// [`toggle`]: SessionCoordinator::toggle
pub struct SessionCoordinator {
    commands: Sender<Command>,
    state: Arc<Mutex<SessionState>>,
    worker: Option<JoinHandle<()>>,
    runtime: Option<Runtime>,
}

impl SessionCoordinator {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        sinks: Vec<Arc<dyn SessionSink>>,
        recordings_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        Self::with_capture(
            || Box::new(Capture::new()),
            transcriber,
            sinks,
            recordings_dir,
        )
    }

    fn with_capture<F>(
        make_capture: F,
        transcriber: Arc<dyn Transcriber>,
        sinks: Vec<Arc<dyn SessionSink>>,
        recordings_dir: PathBuf,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce() -> Box<dyn CaptureSource> + Send + 'static,
    {
        fs::create_dir_all(&recordings_dir).with_context(|| {
            format!(
                "Failed to create recordings directory {}",
                recordings_dir.display()
            )
        })?;
        sweep_stale_recordings(&recordings_dir);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("Failed to build transcription runtime")?;

        let (commands, receiver) = mpsc::channel();
        let state = Arc::new(Mutex::new(SessionState::Idle));

        let worker = thread::Builder::new()
            .name("whisprer-session".to_owned())
            .spawn({
                let completions = commands.clone();
                let state = state.clone();
                let jobs = runtime.handle().clone();
                move || {
                    let mut worker = Worker {
                        capture: make_capture(),
                        transcriber,
                        sinks,
                        state,
                        jobs,
                        completions,
                        recordings_dir,
                    };
                    worker.run(receiver);
                }
            })
            .context("Failed to spawn session worker")?;

        Ok(Self {
            commands,
            state,
            worker: Some(worker),
            runtime: Some(runtime),
        })
    }

    /// Queue a toggle. This is the single entry point for every trigger.
    pub fn toggle(&self) {
        if self.commands.send(Command::Toggle).is_err() {
            warn!("session worker is gone, toggle dropped");
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Stop the worker and tear down the runtime, waiting briefly for an
    /// in-flight transcription before abandoning it. An orphaned audio
    /// file is removed by the sweep on the next start.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.commands.send(Command::Shutdown).ok();
        if worker.join().is_err() {
            warn!("session worker panicked during shutdown");
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
        }
        info!("session stopped");
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    capture: Box<dyn CaptureSource>,
    transcriber: Arc<dyn Transcriber>,
    sinks: Vec<Arc<dyn SessionSink>>,
    state: Arc<Mutex<SessionState>>,
    jobs: Handle,
    completions: Sender<Command>,
    recordings_dir: PathBuf,
}

impl Worker {
    fn run(&mut self, receiver: Receiver<Command>) {
        while let Ok(command) = receiver.recv() {
            match command {
                Command::Toggle => self.handle_toggle(),
                Command::JobDone { audio, result } => self.handle_job_done(&audio, result),
                Command::Shutdown => break,
            }
        }
        if self.capture.is_capturing() {
            info!("discarding live capture on shutdown");
            self.capture.abort();
        }
    }

    fn handle_toggle(&mut self) {
        match self.state() {
            SessionState::Idle => self.start_recording(),
            SessionState::Recording => self.finish_recording(),
            SessionState::Transcribing => {
                info!("toggle ignored while a transcription is in flight");
                self.report_status("Transcription in progress");
            }
        }
    }

    fn start_recording(&mut self) {
        match self.capture.start() {
            Ok(()) => self.set_state(SessionState::Recording),
            Err(e) => self.report_error(capture_error_kind(&e), &e.to_string()),
        }
    }

    fn finish_recording(&mut self) {
        let destination = self.recordings_dir.join(recording_filename());
        match self.capture.stop(&destination) {
            Ok(Some(stats)) => {
                info!(
                    bytes = stats.bytes,
                    seconds = stats.duration.as_secs_f64(),
                    "capture finished"
                );
                self.set_state(SessionState::Transcribing);
                self.spawn_transcription(destination);
            }
            Ok(None) => {
                self.report_status("Nothing recorded");
                self.set_state(SessionState::Idle);
            }
            Err(e) => {
                // A partially written file may exist when encoding failed.
                if destination.exists() {
                    remove_recording(&destination);
                }
                self.report_error(capture_error_kind(&e), &e.to_string());
                self.set_state(SessionState::Idle);
            }
        }
    }

    fn spawn_transcription(&self, audio: PathBuf) {
        let transcriber = self.transcriber.clone();
        let completions = self.completions.clone();
        debug!(transcriber = transcriber.name(), "transcription scheduled");
        self.jobs.spawn(async move {
            let result = transcriber.transcribe(&audio).await;
            // The worker may already be gone on shutdown; the sweep picks
            // up the file in that case.
            completions.send(Command::JobDone { audio, result }).ok();
        });
    }

    fn handle_job_done(&mut self, audio: &Path, result: Result<String, TranscribeError>) {
        remove_recording(audio);
        match result {
            Ok(transcript) => {
                info!(chars = transcript.len(), "transcript ready");
                for sink in &self.sinks {
                    sink.on_transcript(&transcript);
                }
            }
            Err(e) => self.report_error(transcribe_error_kind(&e), &e.to_string()),
        }
        self.set_state(SessionState::Idle);
    }

    fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
        for sink in &self.sinks {
            sink.on_state_changed(state);
        }
    }

    fn report_error(&self, kind: ErrorKind, message: &str) {
        for sink in &self.sinks {
            sink.on_error(kind, message);
        }
    }

    fn report_status(&self, message: &str) {
        for sink in &self.sinks {
            sink.on_status(message);
        }
    }
}

fn capture_error_kind(error: &CaptureError) -> ErrorKind {
    match error {
        CaptureError::NoInputDevice => ErrorKind::NoInputDevice,
        _ => ErrorKind::CaptureIo,
    }
}

fn transcribe_error_kind(error: &TranscribeError) -> ErrorKind {
    match error {
        TranscribeError::MissingCredential => ErrorKind::MissingCredential,
        TranscribeError::Timeout => ErrorKind::TranscriptionTimeout,
        TranscribeError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        TranscribeError::Io(_) => ErrorKind::CaptureIo,
        TranscribeError::Service { .. } | TranscribeError::Network(_) => {
            ErrorKind::TranscriptionService
        }
    }
}

fn recording_filename() -> String {
    let epoch_millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("recording_{epoch_millis}.wav")
}

/// Best effort removal; a leftover file must never mask the outcome that
/// produced it.
fn remove_recording(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("failed to remove {}: {e}", path.display());
    }
}

/// Remove recordings orphaned by a crash or a shutdown that abandoned an
/// in-flight transcription.
fn sweep_stale_recordings(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut swept = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with("recording_")
            && name.ends_with(".wav")
            && fs::remove_file(&path).is_ok()
        {
            swept += 1;
        }
    }

    if swept > 0 {
        info!(count = swept, "removed stale recordings");
    }
}

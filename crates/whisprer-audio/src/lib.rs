//! Microphone capture at a fixed PCM format.
//!
//! Capture always runs at 44.1 kHz, 16-bit signed little-endian, stereo,
//! regardless of what the device would prefer. Devices that cannot supply
//! that format are skipped during selection.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

mod capture;

pub use capture::Capture;

/// Capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;
/// Bits per sample.
pub const BITS_PER_SAMPLE: u16 = 16;
/// Channel count.
pub const CHANNELS: u16 = 2;
/// Bytes per frame (one 16-bit sample per channel).
pub const FRAME_BYTES: usize = (BITS_PER_SAMPLE as usize / 8) * CHANNELS as usize;
/// Raw PCM throughput at the capture format.
pub const BYTES_PER_SECOND: usize = SAMPLE_RATE as usize * FRAME_BYTES;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// No input device advertises the capture format.
    #[error("no compatible input device available")]
    NoInputDevice,
    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
    /// The device reported a fault while the capture was live.
    #[error("audio stream fault: {0}")]
    Stream(String),
    /// WAV encoding failed after the device was released.
    #[error("failed to encode wav: {0}")]
    Encode(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Byte count and play length of a finished capture.
#[derive(Debug, Clone, Copy)]
pub struct CaptureStats {
    pub bytes: usize,
    pub duration: Duration,
}

impl CaptureStats {
    /// Stats for `bytes` octets of raw PCM at the capture format.
    pub fn for_buffer(bytes: usize) -> Self {
        Self {
            bytes,
            duration: Duration::from_secs_f64(bytes as f64 / BYTES_PER_SECOND as f64),
        }
    }
}

/// Microphone capture as seen by the session coordinator.
///
/// Implementations are driven from a single thread and need not be `Send`;
/// the real capture holds a `cpal::Stream`, which is not.
pub trait CaptureSource {
    /// Begin capturing. No-op when a capture is already running.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and write the buffered audio to `destination` as WAV.
    ///
    /// Returns `Ok(None)` without creating a file when nothing was
    /// captured, including when no capture was running at all. The device
    /// is released and the buffer cleared on every path, even when
    /// encoding fails.
    fn stop(&mut self, destination: &Path) -> Result<Option<CaptureStats>>;

    /// Stop capturing and discard the buffer without writing a file.
    fn abort(&mut self);

    /// True while a capture is running.
    fn is_capturing(&self) -> bool;
}

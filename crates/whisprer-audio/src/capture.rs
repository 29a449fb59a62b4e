use std::mem;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, Host, SampleFormat, SampleRate, Stream, StreamConfig,
    SupportedStreamConfigRange,
};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::{
    BITS_PER_SAMPLE, CHANNELS, CaptureError, CaptureSource, CaptureStats, Result, SAMPLE_RATE,
};

/// Frames per stream buffer, 4096 bytes of PCM at the capture format.
const CHUNK_FRAMES: u32 = 1024;

/// How long to let an in-flight callback drain after the capture flag is
/// cleared, before the stream is closed.
const STOP_GRACE: Duration = Duration::from_millis(100);

/// Captures microphone audio into an in-memory PCM buffer.
///
/// The stream callback is the only writer to the buffer and appends only
/// while the capturing flag is set, so taking the buffer after the stream
/// is closed observes a complete capture.
pub struct Capture {
    host: Host,
    buffer: Arc<Mutex<Vec<u8>>>,
    capturing: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<String>>>,
    stream: Option<Stream>,
}

impl Capture {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            buffer: Arc::new(Mutex::new(Vec::new())),
            capturing: Arc::new(AtomicBool::new(false)),
            fault: Arc::new(Mutex::new(None)),
            stream: None,
        }
    }

    /// First input device that advertises the capture format.
    fn select_device(&self) -> Result<Device> {
        for device in self.host.input_devices()? {
            let Ok(mut configs) = device.supported_input_configs() else {
                debug!("skipping input device with unreadable configs");
                continue;
            };
            if configs.any(|range| supports_capture_format(&range)) {
                return Ok(device);
            }
        }
        Err(CaptureError::NoInputDevice)
    }

    fn build_stream(&self, device: &Device) -> Result<Stream> {
        let config = StreamConfig {
            channels: CHANNELS,
            sample_rate: SampleRate(SAMPLE_RATE),
            buffer_size: BufferSize::Fixed(CHUNK_FRAMES),
        };

        let buffer = self.buffer.clone();
        let capturing = self.capturing.clone();
        let fault = self.fault.clone();

        let stream = device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if !capturing.load(Ordering::Acquire) {
                    return;
                }
                let mut buffer = buffer.lock();
                for &sample in data {
                    buffer.extend_from_slice(&sample.to_le_bytes());
                }
            },
            move |err| {
                error!("audio stream fault: {err}");
                // Keep the first fault; it is the root cause.
                fault.lock().get_or_insert_with(|| err.to_string());
            },
            None,
        )?;

        Ok(stream)
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for Capture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let device = self.select_device()?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_owned());

        self.buffer.lock().clear();
        self.fault.lock().take();
        self.capturing.store(true, Ordering::Release);

        let started = self.build_stream(&device).and_then(|stream| {
            stream.play()?;
            Ok(stream)
        });

        match started {
            Ok(stream) => {
                info!(device = %name, "capturing from input device");
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                self.capturing.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    fn stop(&mut self, destination: &Path) -> Result<Option<CaptureStats>> {
        let Some(stream) = self.stream.take() else {
            return Ok(None);
        };

        self.capturing.store(false, Ordering::Release);
        thread::sleep(STOP_GRACE);
        stream.pause().ok();
        drop(stream);

        let bytes = mem::take(&mut *self.buffer.lock());
        if let Some(fault) = self.fault.lock().take() {
            return Err(CaptureError::Stream(fault));
        }
        if bytes.is_empty() {
            return Ok(None);
        }

        encode_wav(destination, &bytes)?;
        Ok(Some(CaptureStats::for_buffer(bytes.len())))
    }

    fn abort(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.capturing.store(false, Ordering::Release);
            stream.pause().ok();
            drop(stream);
            info!("capture aborted");
        }
        self.buffer.lock().clear();
        self.fault.lock().take();
    }

    fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

fn supports_capture_format(range: &SupportedStreamConfigRange) -> bool {
    range.channels() == CHANNELS
        && range.sample_format() == SampleFormat::I16
        && range.min_sample_rate() <= SampleRate(SAMPLE_RATE)
        && range.max_sample_rate() >= SampleRate(SAMPLE_RATE)
}

fn encode_wav(destination: &Path, bytes: &[u8]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(destination, spec)?;
    for sample in bytes.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
    }
    writer.finalize()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use cpal::SupportedBufferSize;
    use tempfile::tempdir;

    use super::*;
    use crate::BYTES_PER_SECOND;

    fn range(
        channels: u16,
        min_rate: u32,
        max_rate: u32,
        format: SampleFormat,
    ) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min_rate),
            SampleRate(max_rate),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn format_predicate_accepts_matching_range() {
        assert!(supports_capture_format(&range(
            2,
            8_000,
            48_000,
            SampleFormat::I16
        )));
        assert!(supports_capture_format(&range(
            2,
            44_100,
            44_100,
            SampleFormat::I16
        )));
    }

    #[test]
    fn format_predicate_rejects_other_shapes() {
        // Mono, float samples, and ranges that exclude 44.1 kHz.
        assert!(!supports_capture_format(&range(
            1,
            8_000,
            48_000,
            SampleFormat::I16
        )));
        assert!(!supports_capture_format(&range(
            2,
            8_000,
            48_000,
            SampleFormat::F32
        )));
        assert!(!supports_capture_format(&range(
            2,
            48_000,
            96_000,
            SampleFormat::I16
        )));
        assert!(!supports_capture_format(&range(
            2,
            8_000,
            22_050,
            SampleFormat::I16
        )));
    }

    #[test]
    fn encode_wav_round_trips_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.wav");

        let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 8_000, -8_000, 42];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        encode_wav(&path, &bytes).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, CHANNELS);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, BITS_PER_SAMPLE);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("none.wav");

        let mut capture = Capture::new();
        assert!(!capture.is_capturing());
        assert!(capture.stop(&path).unwrap().is_none());
        assert!(!path.exists());

        // Aborting while idle must also be harmless.
        capture.abort();
        assert!(!capture.is_capturing());
    }

    #[test]
    fn stats_follow_the_fixed_rate() {
        assert_eq!(
            CaptureStats::for_buffer(BYTES_PER_SECOND).duration,
            Duration::from_secs(1)
        );
        assert_eq!(
            CaptureStats::for_buffer(BYTES_PER_SECOND / 2).duration,
            Duration::from_millis(500)
        );
        assert_eq!(CaptureStats::for_buffer(0).duration, Duration::ZERO);
    }
}

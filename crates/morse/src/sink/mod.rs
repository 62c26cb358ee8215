//! Audio sinks.
//!
//! A sink takes blocks of signed 16-bit mono samples and plays them in the
//! order they were written. Sessions only talk to the [`Sink`] trait, so the
//! same encoder drives a sound card, a WAV file, or a recorder in tests.
//!
//! ```text
//! Session ── push(sample) ──► BlockBuffer ── write(block) ──► Sink
//!                              (16K samples)                  ALSA / WAV / recorder
//! ```

use std::time::Duration;

use thiserror::Error;

mod buffer;
mod recording;
mod wav;

#[cfg(feature = "alsa")]
mod alsa;

pub use buffer::{BlockBuffer, BLOCK_SIZE};
pub use recording::{RecordingSink, SinkEvent, SinkOp};
pub use wav::WavSink;

#[cfg(feature = "alsa")]
pub use self::alsa::AlsaSink;

/// How long the device may queue audio ahead of playback.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

/// Stream layout handed to [`Sink::configure`].
///
/// Samples are always signed 16-bit little-endian, interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub latency: Duration,
}

impl StreamParams {
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Sink failures. All of them are fatal for the session that hit them.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open audio device {device}: {message}")]
    Open { device: String, message: String },

    #[error("audio {op} failed: {message}")]
    Device { op: SinkOp, message: String },

    #[error("sink used before configure")]
    NotConfigured,

    #[error("sink is closed")]
    Closed,

    #[error("WAV output failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Playback device for Morse audio.
///
/// Opening the device is the job of each backend's constructor.
pub trait Sink {
    /// Set up the stream. Called before the first write and again whenever
    /// the sample rate changes. A repeat call can come while earlier audio
    /// is still queued; the backend either lets it finish first or refuses
    /// with an error.
    fn configure(&mut self, params: &StreamParams) -> Result<(), SinkError>;

    /// Submit samples. Order is preserved; may block while the device queue
    /// is full.
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError>;

    /// Block until everything written so far has been played.
    fn drain(&mut self) -> Result<(), SinkError>;

    /// Release the device.
    fn close(&mut self) -> Result<(), SinkError>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn configure(&mut self, params: &StreamParams) -> Result<(), SinkError> {
        (**self).configure(params)
    }

    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        (**self).write(samples)
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        (**self).drain()
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}

use thiserror::Error;

use crate::sink::SinkError;

/// Errors from a Morse session.
///
/// Out-of-range speed and amplitude are clamped rather than reported, and
/// characters without a code are skipped, so nothing here covers them.
#[derive(Debug, Error)]
pub enum MorseError {
    #[error("audio device error: {0}")]
    Sink(#[from] SinkError),

    #[error("session is closed")]
    Closed,

    #[error("session is unusable after an earlier device failure")]
    Failed,

    #[error("transmission interrupted")]
    Cancelled,

    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("tone frequency must be positive and finite, got {0}")]
    InvalidToneFrequency(f64),
}

pub type Result<T, E = MorseError> = std::result::Result<T, E>;

//! Morse session: settings, derived timing and the sink lifecycle.
//!
//! A session is created with its settings, does nothing to the sink until the
//! first character is sent, and ends with [`Session::drain`] followed by
//! [`Session::close`]. The character/word/string operations live in
//! [`crate::sequencer`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{MorseError, Result};
use crate::sink::{BlockBuffer, Sink, SinkError, StreamParams, DEFAULT_LATENCY};
use crate::synth::{silence, Tone, ToneShape};
use crate::timing::{clamp_amplitude, clamp_wpm, round_half_up, Timing};

pub const DEFAULT_WPM: u32 = 18;
pub const DEFAULT_AMPLITUDE: u32 = 85;
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_TONE_FREQUENCY: f64 = 800.0;

/// User-facing settings of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Words per minute, 5..=60.
    pub wpm: u32,
    /// Stretch gaps instead of slowing elements below 18 WPM.
    pub farnsworth: bool,
    /// Volume in percent, 0..=100.
    pub amplitude: u32,
    pub sample_rate: u32,
    /// Tone pitch in Hz.
    pub tone_frequency: f64,
    /// Device queue length requested at configure time.
    pub latency: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            farnsworth: false,
            amplitude: DEFAULT_AMPLITUDE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            tone_frequency: DEFAULT_TONE_FREQUENCY,
            latency: DEFAULT_LATENCY,
        }
    }
}

impl SessionConfig {
    pub fn new(wpm: u32) -> Self {
        Self {
            wpm,
            ..Self::default()
        }
    }

    pub fn with_farnsworth(mut self, farnsworth: bool) -> Self {
        self.farnsworth = farnsworth;
        self
    }

    pub fn with_amplitude(mut self, amplitude: u32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_tone_frequency(mut self, tone_frequency: f64) -> Self {
        self.tone_frequency = tone_frequency;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Timing derived from these settings.
    pub fn timing(&self) -> Timing {
        Timing::compute(self.wpm, self.farnsworth, self.amplitude, self.sample_rate)
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(MorseError::InvalidSampleRate(self.sample_rate));
        }
        validate_tone_frequency(self.tone_frequency)
    }
}

fn validate_tone_frequency(frequency: f64) -> Result<()> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(MorseError::InvalidToneFrequency(frequency))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing sent yet; the sink has not been configured.
    Idle,
    Ready,
    /// A sink call failed. Only `close` is still allowed.
    Failed,
    Closed,
}

/// One transmission run against one sink.
pub struct Session<S: Sink> {
    config: SessionConfig,
    pub(crate) timing: Timing,
    sink: S,
    buffer: Option<BlockBuffer>,
    phase: Phase,
    /// Silence owed before the next tone.
    pub(crate) pending_gap: u32,
    /// Inside a `<...>` group, character gaps are suppressed.
    pub(crate) in_prosign: bool,
    sample_counter: u64,
    // Seconds played at earlier sample rates, and the counter value when the
    // current rate took effect.
    elapsed_before: f64,
    rate_mark: u64,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<S: Sink> Session<S> {
    /// Create a session. Timing is derived immediately; the sink is left
    /// alone until the first character is sent.
    pub fn new(sink: S, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let mut config = config;
        config.wpm = clamp_wpm(config.wpm);
        config.amplitude = clamp_amplitude(config.amplitude);
        let timing = config.timing();

        debug!(
            wpm = config.wpm,
            farnsworth = config.farnsworth,
            bit_time = timing.bit_time,
            char_delay = timing.char_delay,
            word_delay = timing.word_delay,
            "session created"
        );

        Ok(Self {
            config,
            timing,
            sink,
            buffer: None,
            phase: Phase::Idle,
            pending_gap: 0,
            in_prosign: false,
            sample_counter: 0,
            elapsed_before: 0.0,
            rate_mark: 0,
            interrupt: None,
        })
    }

    /// Create a session at `wpm` with every other setting at its default.
    pub fn with_wpm(sink: S, wpm: u32) -> Result<Self> {
        Self::new(sink, SessionConfig::new(wpm))
    }

    /// Stop sending at the next element boundary once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn wpm(&self) -> u32 {
        self.config.wpm
    }

    pub fn farnsworth(&self) -> bool {
        self.config.farnsworth
    }

    pub fn amplitude(&self) -> u32 {
        self.config.amplitude
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn tone_frequency(&self) -> f64 {
        self.config.tone_frequency
    }

    /// Silence that will precede the next tone, in samples.
    pub fn pending_gap(&self) -> u32 {
        self.pending_gap
    }

    /// Total samples emitted since setup.
    pub fn sample_count(&self) -> u64 {
        self.sample_counter
    }

    /// Whether the one-time sink setup has happened.
    pub fn is_setup(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn set_wpm(&mut self, wpm: u32) {
        self.config.wpm = clamp_wpm(wpm);
        self.recalc();
    }

    pub fn set_farnsworth(&mut self, farnsworth: bool) {
        self.config.farnsworth = farnsworth;
        self.recalc();
    }

    pub fn set_amplitude(&mut self, amplitude: u32) {
        self.config.amplitude = clamp_amplitude(amplitude);
        self.recalc();
    }

    pub fn set_tone_frequency(&mut self, tone_frequency: f64) -> Result<()> {
        validate_tone_frequency(tone_frequency)?;
        self.config.tone_frequency = tone_frequency;
        Ok(())
    }

    /// Change the sample rate.
    ///
    /// Once audio has started, the partial block is written at the old rate,
    /// the sink is configured again, and the owed gap is rescaled.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(MorseError::InvalidSampleRate(sample_rate));
        }
        self.ensure_usable()?;

        let old_rate = self.config.sample_rate;
        if sample_rate == old_rate {
            return Ok(());
        }

        if self.phase == Phase::Ready {
            self.flush_buffer()?;
            let played = self.sample_counter - self.rate_mark;
            self.elapsed_before += played as f64 / old_rate as f64;
            self.rate_mark = self.sample_counter;
            self.pending_gap = round_half_up(
                self.pending_gap as f64 * sample_rate as f64 / old_rate as f64,
            ) as u32;

            self.config.sample_rate = sample_rate;
            let params = self.stream_params();
            let configured = self.sink.configure(&params);
            self.device(configured)?;
            debug!(old_rate, sample_rate, "sink reconfigured for new sample rate");
        } else {
            self.config.sample_rate = sample_rate;
        }

        self.recalc();
        Ok(())
    }

    /// Elapsed audio time in seconds: samples emitted over the sample rate.
    pub fn timestamp(&self) -> f64 {
        self.elapsed_before
            + (self.sample_counter - self.rate_mark) as f64 / self.config.sample_rate as f64
    }

    /// Play out the owed gap and everything buffered, then wait for the
    /// device to finish.
    pub fn drain(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if self.phase == Phase::Idle {
            debug!("drain before any audio, nothing to flush");
            return Ok(());
        }

        let gap = std::mem::take(&mut self.pending_gap);
        self.emit_silence(gap)?;
        self.flush_buffer()?;

        let drained = self.sink.drain();
        self.device(drained)?;
        debug!(
            samples = self.sample_counter,
            seconds = self.timestamp(),
            "playback drained"
        );
        Ok(())
    }

    /// Release the sink. Nothing else may be called afterwards.
    pub fn close(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Err(MorseError::Closed);
        }
        self.phase = Phase::Closed;
        if self.buffer.take().is_some_and(|b| !b.is_empty()) {
            warn!("closing with undrained audio; buffered samples discarded");
        }
        self.sink.close()?;
        debug!("session closed");
        Ok(())
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        match self.phase {
            Phase::Closed => Err(MorseError::Closed),
            Phase::Failed => Err(MorseError::Failed),
            Phase::Idle | Phase::Ready => Ok(()),
        }
    }

    /// One-time setup before the first character: fresh timing, zeroed
    /// counters, configured sink and an empty block buffer.
    pub(crate) fn commence(&mut self) -> Result<()> {
        self.recalc();
        self.pending_gap = 0;
        self.sample_counter = 0;
        self.elapsed_before = 0.0;
        self.rate_mark = 0;

        let params = self.stream_params();
        let configured = self.sink.configure(&params);
        self.device(configured)?;
        self.buffer = Some(BlockBuffer::new());
        self.phase = Phase::Ready;

        debug!(
            sample_rate = self.config.sample_rate,
            tone_frequency = self.config.tone_frequency,
            "audio setup complete"
        );
        Ok(())
    }

    pub(crate) fn check_interrupt(&self) -> Result<()> {
        match &self.interrupt {
            Some(flag) if flag.load(Ordering::SeqCst) => {
                warn!(
                    pending_gap = self.pending_gap,
                    "interrupt requested, stopping at element boundary"
                );
                Err(MorseError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    /// Emit a tone of `len` samples.
    pub(crate) fn emit_tone(&mut self, len: u32) -> Result<()> {
        let tone = Tone::new(self.tone_shape(), len);
        self.emit(tone)
    }

    /// Emit `len` samples of silence.
    pub(crate) fn emit_silence(&mut self, len: u32) -> Result<()> {
        self.emit(silence(len))
    }

    fn emit(&mut self, samples: impl Iterator<Item = i16>) -> Result<()> {
        let buffer = self
            .buffer
            .as_mut()
            .ok_or(MorseError::Sink(SinkError::NotConfigured))?;

        for sample in samples {
            if let Err(e) = buffer.push(&mut self.sink, sample) {
                error!(error = %e, "audio write failed");
                self.phase = Phase::Failed;
                return Err(e.into());
            }
            self.sample_counter += 1;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        let flushed = match self.buffer.as_mut() {
            Some(buffer) => buffer.flush(&mut self.sink),
            None => Ok(()),
        };
        self.device(flushed)
    }

    /// Mark the session failed when a sink call did.
    fn device<T>(&mut self, result: std::result::Result<T, SinkError>) -> Result<T> {
        result.map_err(|e| {
            error!(error = %e, "audio device failed");
            self.phase = Phase::Failed;
            MorseError::Sink(e)
        })
    }

    fn recalc(&mut self) {
        self.timing = self.config.timing();
    }

    fn tone_shape(&self) -> ToneShape {
        ToneShape {
            peak_amplitude: self.timing.peak_amplitude,
            frequency: self.config.tone_frequency,
            sample_rate: self.config.sample_rate,
        }
    }

    fn stream_params(&self) -> StreamParams {
        StreamParams::mono(self.config.sample_rate).with_latency(self.config.latency)
    }
}

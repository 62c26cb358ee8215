//! ALSA playback sink.

use alsa::pcm::{Access, Format, HwParams, State, PCM};
use alsa::{Direction, ValueOr};
use tracing::{debug, warn};

use super::{Sink, SinkError, SinkOp, StreamParams};

/// Sound card output through an ALSA PCM device such as `"default"`.
pub struct AlsaSink {
    device: String,
    pcm: Option<PCM>,
}

fn device_error(op: SinkOp) -> impl Fn(alsa::Error) -> SinkError {
    move |e| SinkError::Device {
        op,
        message: e.to_string(),
    }
}

/// What has to happen to a stream before its hardware parameters can be
/// set again. The kernel only accepts new parameters in OPEN, SETUP or
/// PREPARED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settle {
    Ready,
    /// Play out what is queued, then stop.
    Drain,
    /// Discard a stream that has already broken off.
    Drop,
}

fn settle_for(state: State) -> Settle {
    match state {
        State::Running | State::Draining | State::Paused => Settle::Drain,
        State::XRun | State::Suspended => Settle::Drop,
        State::Open | State::Setup | State::Prepared | State::Disconnected => Settle::Ready,
    }
}

impl AlsaSink {
    /// Open the playback device. There is no retry; a missing device is
    /// reported straight back.
    pub fn open(device: &str) -> Result<Self, SinkError> {
        let pcm = PCM::new(device, Direction::Playback, false).map_err(|e| SinkError::Open {
            device: device.to_string(),
            message: e.to_string(),
        })?;
        debug!(device, "opened ALSA playback device");

        Ok(Self {
            device: device.to_string(),
            pcm: Some(pcm),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    fn pcm(&self) -> Result<&PCM, SinkError> {
        self.pcm.as_ref().ok_or(SinkError::Closed)
    }
}

impl Sink for AlsaSink {
    fn configure(&mut self, params: &StreamParams) -> Result<(), SinkError> {
        let pcm = self.pcm()?;
        let err = device_error(SinkOp::Configure);

        // A sample-rate change arrives while the stream is still playing.
        let state = pcm.state();
        match settle_for(state) {
            Settle::Ready => {}
            Settle::Drain => {
                pcm.drain().map_err(&err)?;
                debug!(device = %self.device, ?state, "drained stream before reconfiguring");
            }
            Settle::Drop => {
                pcm.drop().map_err(&err)?;
                debug!(device = %self.device, ?state, "dropped stream before reconfiguring");
            }
        }

        let hwp = HwParams::any(pcm).map_err(&err)?;
        hwp.set_access(Access::RWInterleaved).map_err(&err)?;
        hwp.set_format(Format::S16LE).map_err(&err)?;
        hwp.set_channels(params.channels as u32).map_err(&err)?;
        hwp.set_rate_resample(true).map_err(&err)?;
        hwp.set_rate(params.sample_rate, ValueOr::Nearest).map_err(&err)?;
        let latency_us = params.latency.as_micros().min(u32::MAX as u128) as u32;
        let buffer_us = hwp
            .set_buffer_time_near(latency_us, ValueOr::Nearest)
            .map_err(&err)?;
        pcm.hw_params(&hwp).map_err(&err)?;

        debug!(
            device = %self.device,
            sample_rate = params.sample_rate,
            buffer_us,
            "ALSA stream configured"
        );
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        let pcm = self.pcm()?;
        let io = pcm.io_i16().map_err(device_error(SinkOp::Write))?;

        let mut offset = 0;
        while offset < samples.len() {
            match io.writei(&samples[offset..]) {
                Ok(frames) => offset += frames,
                Err(e) => {
                    warn!(device = %self.device, error = %e, "ALSA write failed, recovering");
                    pcm.try_recover(e, true)
                        .map_err(device_error(SinkOp::Write))?;
                }
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        let pcm = self.pcm()?;
        pcm.drain().map_err(device_error(SinkOp::Drain))?;
        // Back to PREPARED so the session can keep sending after a drain.
        pcm.prepare().map_err(device_error(SinkOp::Drain))?;
        debug!(device = %self.device, "ALSA playback drained");
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        // Dropping the PCM closes the device.
        self.pcm.take().ok_or(SinkError::Closed)?;
        debug!(device = %self.device, "ALSA device closed");
        Ok(())
    }
}

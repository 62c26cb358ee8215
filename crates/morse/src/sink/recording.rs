//! In-memory sink that records every call, for tests and offline rendering.

use std::fmt;

use super::{Sink, SinkError, StreamParams};

/// Sink operations, used in errors and for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOp {
    Configure,
    Write,
    Drain,
    Close,
}

impl fmt::Display for SinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkOp::Configure => "configure",
            SinkOp::Write => "write",
            SinkOp::Drain => "drain",
            SinkOp::Close => "close",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Configure(StreamParams),
    /// Number of samples in the write.
    Write(usize),
    Drain,
    Close,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
    samples: Vec<i16>,
    fail_on: Option<SinkOp>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose first call of `op` fails, like a device unplugged mid-run.
    pub fn failing_on(op: SinkOp) -> Self {
        Self {
            fail_on: Some(op),
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Every sample written so far, in order.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn write_sizes(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Write(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn configured(&self) -> Vec<StreamParams> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Configure(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn was_drained(&self) -> bool {
        self.events.contains(&SinkEvent::Drain)
    }

    pub fn is_closed(&self) -> bool {
        self.events.contains(&SinkEvent::Close)
    }

    fn check(&mut self, op: SinkOp) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        if self.fail_on == Some(op) {
            self.fail_on = None;
            return Err(SinkError::Device {
                op,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Sink for RecordingSink {
    fn configure(&mut self, params: &StreamParams) -> Result<(), SinkError> {
        self.check(SinkOp::Configure)?;
        self.events.push(SinkEvent::Configure(*params));
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        self.check(SinkOp::Write)?;
        if self.configured().is_empty() {
            return Err(SinkError::NotConfigured);
        }
        self.events.push(SinkEvent::Write(samples.len()));
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        self.check(SinkOp::Drain)?;
        self.events.push(SinkEvent::Drain);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.check(SinkOp::Close)?;
        self.events.push(SinkEvent::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_requires_configure() {
        let mut sink = RecordingSink::new();
        assert!(matches!(sink.write(&[1]), Err(SinkError::NotConfigured)));
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mut sink = RecordingSink::failing_on(SinkOp::Drain);
        sink.configure(&StreamParams::mono(8000)).unwrap();

        assert!(matches!(
            sink.drain(),
            Err(SinkError::Device { op: SinkOp::Drain, .. })
        ));
        sink.drain().unwrap();
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_closed_sink_rejects_calls() {
        let mut sink = RecordingSink::new();
        sink.close().unwrap();
        assert!(sink.is_closed());
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }
}

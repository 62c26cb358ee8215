//! WAV file sink.
//!
//! Renders the transmission to a 16-bit mono WAV file with hound. The file
//! is created on configure, since the header needs the sample rate.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Sink, SinkError, SinkOp, StreamParams};

pub struct WavSink {
    path: PathBuf,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    sample_rate: Option<u32>,
    closed: bool,
}

impl WavSink {
    /// Prepare a sink writing to `path`. Nothing touches the disk until
    /// the stream is configured.
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
            sample_rate: None,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut hound::WavWriter<BufWriter<File>>, SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.writer.as_mut().ok_or(SinkError::NotConfigured)
    }
}

impl Sink for WavSink {
    fn configure(&mut self, params: &StreamParams) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        match self.sample_rate {
            Some(rate) if rate == params.sample_rate => return Ok(()),
            Some(rate) => {
                return Err(SinkError::Device {
                    op: SinkOp::Configure,
                    message: format!(
                        "{} is already being written at {} Hz, cannot switch to {} Hz",
                        self.path.display(),
                        rate,
                        params.sample_rate
                    ),
                });
            }
            None => {}
        }

        let spec = hound::WavSpec {
            channels: params.channels,
            sample_rate: params.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        self.writer = Some(hound::WavWriter::create(&self.path, spec)?);
        self.sample_rate = Some(params.sample_rate);
        debug!(path = %self.path.display(), sample_rate = params.sample_rate, "WAV output created");
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        let writer = self.writer()?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        // A file is "played" once the header and data hit the disk.
        self.writer()?.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.closed = true;
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            debug!(path = %self.path.display(), "WAV output finalized");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_before_configure_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(dir.path().join("early.wav"));
        assert!(matches!(sink.write(&[1, 2, 3]), Err(SinkError::NotConfigured)));
    }

    #[test]
    fn test_roundtrip_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = WavSink::create(&path);
        sink.configure(&StreamParams::mono(8000)).unwrap();
        sink.write(&[0, 100, -100, i16::MAX]).unwrap();
        sink.write(&[i16::MIN + 1]).unwrap();
        sink.drain().unwrap();
        sink.close().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 100, -100, i16::MAX, i16::MIN + 1]);
    }

    #[test]
    fn test_rate_change_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(dir.path().join("rate.wav"));
        sink.configure(&StreamParams::mono(44100)).unwrap();
        sink.configure(&StreamParams::mono(44100)).unwrap();
        assert!(matches!(
            sink.configure(&StreamParams::mono(48000)),
            Err(SinkError::Device { op: SinkOp::Configure, .. })
        ));
    }

    #[test]
    fn test_close_twice() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = WavSink::create(dir.path().join("twice.wav"));
        sink.configure(&StreamParams::mono(8000)).unwrap();
        sink.close().unwrap();
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }
}

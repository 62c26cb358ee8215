//! Block buffering between the synthesizer and a sink.
//!
//! Samples are collected one at a time and handed to the sink as whole
//! blocks. A partial block only goes out on an explicit flush, so device
//! submissions are never fragmented mid-transmission.

use super::{Sink, SinkError};

/// Samples per device submission.
pub const BLOCK_SIZE: usize = 16 * 1024;

#[derive(Debug)]
pub struct BlockBuffer {
    block: Vec<i16>,
    capacity: usize,
}

impl BlockBuffer {
    pub fn new() -> Self {
        Self::with_capacity(BLOCK_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            block: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Add one sample, writing the block out once it is full.
    pub fn push<S: Sink + ?Sized>(&mut self, sink: &mut S, sample: i16) -> Result<(), SinkError> {
        self.block.push(sample);
        if self.block.len() >= self.capacity {
            sink.write(&self.block)?;
            self.block.clear();
        }
        Ok(())
    }

    /// Write out whatever is buffered, full block or not.
    pub fn flush<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SinkError> {
        if !self.block.is_empty() {
            sink.write(&self.block)?;
            self.block.clear();
        }
        Ok(())
    }

    /// Samples waiting for the next write.
    pub fn len(&self) -> usize {
        self.block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BlockBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, StreamParams};

    fn configured_sink() -> RecordingSink {
        let mut sink = RecordingSink::new();
        sink.configure(&StreamParams::mono(8000)).unwrap();
        sink
    }

    #[test]
    fn test_partial_block_is_held() {
        let mut sink = configured_sink();
        let mut buffer = BlockBuffer::with_capacity(4);

        for s in 0..3 {
            buffer.push(&mut sink, s).unwrap();
        }
        assert!(sink.write_sizes().is_empty());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_full_block_is_written() {
        let mut sink = configured_sink();
        let mut buffer = BlockBuffer::with_capacity(4);

        for s in 0..9 {
            buffer.push(&mut sink, s).unwrap();
        }
        assert_eq!(sink.write_sizes(), vec![4, 4]);
        assert_eq!(sink.samples(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_flush_writes_tail_once() {
        let mut sink = configured_sink();
        let mut buffer = BlockBuffer::with_capacity(4);

        for s in 0..6 {
            buffer.push(&mut sink, s).unwrap();
        }
        buffer.flush(&mut sink).unwrap();
        buffer.flush(&mut sink).unwrap();

        assert_eq!(sink.write_sizes(), vec![4, 2]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(BlockBuffer::new().capacity(), 16384);
    }
}

use std::io;

use crate::models::descriptor::PcmStreamDescriptor;

/// Outcome of one poll of a [`PcmSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRead {
    /// `n` bytes of interleaved PCM were written to the front of the buffer.
    Data(usize),
    /// Nothing ready yet; poll again later.
    Pending,
    /// The source will never produce more data.
    EndOfStream,
}

/// Capture collaborator supplying raw PCM chunks as they become available.
///
/// Implemented by device backends (microphone drivers, loopback capture) and
/// by [`MemoryPcmSource`] for buffered or synthetic audio. Polled from a
/// single producer thread.
pub trait PcmSource: Send {
    /// Format of the bytes this source produces.
    fn descriptor(&self) -> PcmStreamDescriptor;

    /// Begin producing audio.
    fn start(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Copy the next available chunk into `buf`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<SourceRead>;

    /// Stop producing audio and release device resources.
    fn stop(&mut self) {}
}

/// In-memory PCM source that hands out a fixed buffer chunk by chunk.
#[derive(Debug, Clone)]
pub struct MemoryPcmSource {
    descriptor: PcmStreamDescriptor,
    data: Vec<u8>,
    position: usize,
}

impl MemoryPcmSource {
    pub fn new(descriptor: PcmStreamDescriptor, data: Vec<u8>) -> Self {
        Self {
            descriptor,
            data,
            position: 0,
        }
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl PcmSource for MemoryPcmSource {
    fn descriptor(&self) -> PcmStreamDescriptor {
        self.descriptor
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<SourceRead> {
        if self.remaining() == 0 {
            return Ok(SourceRead::EndOfStream);
        }
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(SourceRead::Data(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_drains_in_chunks() {
        let mut source = MemoryPcmSource::new(PcmStreamDescriptor::default(), (0..10u8).collect());
        let mut buf = [0u8; 4];

        assert_eq!(source.read_chunk(&mut buf).unwrap(), SourceRead::Data(4));
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), SourceRead::Data(4));
        assert_eq!(source.read_chunk(&mut buf).unwrap(), SourceRead::Data(2));
        assert_eq!(&buf[..2], &[8, 9]);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), SourceRead::EndOfStream);
        assert_eq!(source.remaining(), 0);
    }
}

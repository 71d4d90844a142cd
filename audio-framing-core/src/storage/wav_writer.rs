use std::io::{Seek, Write};

use crate::models::descriptor::PcmStreamDescriptor;
use crate::models::error::FramingError;
use crate::models::state::WriterState;
use crate::processing::wav_format;

/// Streaming WAV writer for captures whose length is unknown up front.
///
/// Writes a zero-length placeholder header on [`open`](Self::open), appends
/// PCM verbatim, and on [`finalize`](Self::finalize) seeks back to offset 0
/// and rewrites the header with the accumulated payload length.
///
/// Not synchronized: drive it from one producer at a time, or wrap it in a
/// `Mutex` when the producer and the finalizing thread differ.
///
/// ## File Format
/// ```text
/// [44-byte WAV header]
/// [raw PCM data...]
/// ```
pub struct StreamingWavWriter<W: Write + Seek> {
    sink: W,
    descriptor: Option<PcmStreamDescriptor>,
    payload_bytes: u64,
    state: WriterState,
}

impl<W: Write + Seek> StreamingWavWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            descriptor: None,
            payload_bytes: 0,
            state: WriterState::Idle,
        }
    }

    /// Write the placeholder header. Transitions: idle → header_written → streaming.
    pub fn open(&mut self, descriptor: PcmStreamDescriptor) -> Result<(), FramingError> {
        if self.state != WriterState::Idle {
            return Err(FramingError::invalid_state("open", self.state));
        }
        descriptor.validate().map_err(FramingError::ConfigurationFailed)?;

        let header = header_for(&descriptor, 0);
        self.guard_io(|sink| sink.write_all(&header))?;
        self.state = WriterState::HeaderWritten;

        self.descriptor = Some(descriptor);
        self.state = WriterState::Streaming;
        log::debug!(
            "WAV stream opened: {} Hz, {} ch, {}-bit",
            descriptor.sample_rate_hz,
            descriptor.channel_count,
            descriptor.bits_per_sample
        );
        Ok(())
    }

    /// Append raw PCM bytes in call order.
    pub fn append_payload(&mut self, bytes: &[u8]) -> Result<(), FramingError> {
        if !self.state.is_streaming() {
            return Err(FramingError::invalid_state("append payload", self.state));
        }
        let new_total = self.payload_bytes + bytes.len() as u64;
        if new_total > wav_format::MAX_WAV_PAYLOAD {
            return Err(FramingError::OutOfRange(format!(
                "WAV payload of {} bytes exceeds the {}-byte RIFF limit",
                new_total,
                wav_format::MAX_WAV_PAYLOAD
            )));
        }

        self.guard_io(|sink| sink.write_all(bytes))?;
        self.payload_bytes = new_total;
        Ok(())
    }

    /// Rewrite the header with the final payload length and flush.
    /// Transitions: streaming → finalized. Returns the payload byte count.
    pub fn finalize(&mut self) -> Result<u64, FramingError> {
        let descriptor = match (self.state, self.descriptor) {
            (WriterState::Streaming, Some(descriptor)) => descriptor,
            _ => return Err(FramingError::invalid_state("finalize", self.state)),
        };

        let header = header_for(&descriptor, self.payload_bytes);
        self.guard_io(|sink| {
            wav_format::rewrite_header(sink, &header)?;
            sink.flush()
        })?;

        self.state = WriterState::Finalized;
        log::info!(
            "WAV stream finalized: {} payload bytes ({:.2}s)",
            self.payload_bytes,
            descriptor.duration_secs(self.payload_bytes)
        );
        Ok(self.payload_bytes)
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Payload bytes appended so far, excluding the header.
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    pub fn descriptor(&self) -> Option<PcmStreamDescriptor> {
        self.descriptor
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Release the sink. Calling this before `finalize` leaves the placeholder header in place.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Run a sink operation, moving to `Failed` if it errors.
    fn guard_io<F>(&mut self, op: F) -> Result<(), FramingError>
    where
        F: FnOnce(&mut W) -> std::io::Result<()>,
    {
        op(&mut self.sink).map_err(|e| {
            log::error!("WAV sink failed while {}: {}", self.state, e);
            self.state = WriterState::Failed;
            FramingError::Io(e)
        })
    }
}

fn header_for(descriptor: &PcmStreamDescriptor, payload_bytes: u64) -> [u8; wav_format::WAV_HEADER_SIZE] {
    wav_format::encode_with_bit_depth(
        payload_bytes,
        descriptor.sample_rate_hz,
        descriptor.channel_count,
        descriptor.bits_per_sample,
    )
}

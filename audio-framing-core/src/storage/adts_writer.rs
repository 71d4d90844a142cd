use std::io::Write;

use crate::models::aac::{AacProfile, AdtsFrameConfig};
use crate::models::error::FramingError;
use crate::processing::adts_format::{self, ADTS_HEADER_SIZE, MAX_ADTS_PAYLOAD};

/// Write one AAC-LC access unit prefixed with its ADTS header.
///
/// Header and payload go out in a single `write_all`, so no partial-frame
/// state survives between calls.
pub fn write_frame<W: Write>(
    sink: &mut W,
    payload: &[u8],
    sampling_frequency_index: u8,
    channel_config: u8,
) -> Result<(), FramingError> {
    let config = AdtsFrameConfig {
        profile: AacProfile::Lc,
        sampling_frequency_index,
        channel_config,
    };
    write_frame_with_config(sink, payload, &config)?;
    Ok(())
}

fn write_frame_with_config<W: Write>(
    sink: &mut W,
    payload: &[u8],
    config: &AdtsFrameConfig,
) -> Result<usize, FramingError> {
    if payload.len() > MAX_ADTS_PAYLOAD {
        return Err(FramingError::OutOfRange(format!(
            "AAC access unit of {} bytes exceeds the {}-byte ADTS payload limit",
            payload.len(),
            MAX_ADTS_PAYLOAD
        )));
    }
    let packet_length = (payload.len() + ADTS_HEADER_SIZE) as u16;
    let header = adts_format::encode_checked(packet_length, config)?;

    let mut packet = Vec::with_capacity(packet_length as usize);
    packet.extend_from_slice(&header);
    packet.extend_from_slice(payload);
    sink.write_all(&packet)?;
    Ok(packet.len())
}

/// ADTS stream writer: one self-describing frame per AAC access unit.
///
/// No finalize step; the stream is valid after every completed frame.
pub struct AdtsFrameWriter<W: Write> {
    sink: W,
    config: AdtsFrameConfig,
    frames_written: u64,
    bytes_written: u64,
}

impl<W: Write> AdtsFrameWriter<W> {
    pub fn new(sink: W, config: AdtsFrameConfig) -> Result<Self, FramingError> {
        config.validate().map_err(FramingError::ConfigurationFailed)?;
        Ok(Self {
            sink,
            config,
            frames_written: 0,
            bytes_written: 0,
        })
    }

    pub fn write_frame(&mut self, payload: &[u8]) -> Result<(), FramingError> {
        let written = write_frame_with_config(&mut self.sink, payload, &self.config)?;
        self.frames_written += 1;
        self.bytes_written += written as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), FramingError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn config(&self) -> &AdtsFrameConfig {
        &self.config
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Total bytes written, headers included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

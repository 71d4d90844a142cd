//! ADTS header codec for raw AAC access units.
//!
//! Produces the 7-byte fixed header (MPEG-4, layer 0, protection absent, no
//! CRC) that makes each AAC frame self-describing in a `.aac` stream.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::models::aac::{AacProfile, AdtsFrameConfig};
use crate::models::error::FramingError;

/// Size of an ADTS header without CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// Size of an ADTS header carrying a 16-bit CRC (`protection_absent` = 0).
pub const ADTS_CRC_HEADER_SIZE: usize = 9;

const ADTS_SYNC_WORD: u16 = 0xFFF;

/// Largest value of the 13-bit frame length field (header + payload).
pub const MAX_ADTS_PACKET_LENGTH: u16 = 0x1FFF;

/// Largest raw payload that fits in a single ADTS frame.
pub const MAX_ADTS_PAYLOAD: usize = MAX_ADTS_PACKET_LENGTH as usize - ADTS_HEADER_SIZE;

/// Sample rates addressed by the 4-bit sampling frequency index (indices 13-15 are reserved).
pub const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

pub fn sampling_frequency_index(sample_rate_hz: u32) -> Option<u8> {
    SAMPLING_FREQUENCIES
        .iter()
        .position(|&rate| rate == sample_rate_hz)
        .map(|index| index as u8)
}

pub fn sampling_frequency(index: u8) -> Option<u32> {
    SAMPLING_FREQUENCIES.get(index as usize).copied()
}

/// Encode a 7-byte ADTS header.
///
/// `packet_length` is the whole frame: payload length + 7. Bit layout, MSB first:
/// ```text
/// byte0  1111 1111                      sync word (high)
/// byte1  1111 0 00 1                    sync word (low), MPEG-4, layer 0, protection absent
/// byte2  pp ffff 0 c                    profile (object type - 1), frequency index, channel config bit 2
/// byte3  cc 0000 ll                     channel config bits 1-0, frame length bits 12-11
/// byte4  llll llll                      frame length bits 10-3
/// byte5  lll 11111                      frame length bits 2-0, buffer fullness (high)
/// byte6  111111 00                      buffer fullness (low), one raw data block
/// ```
///
/// Every input is masked to its field width; callers that need lengths above
/// 8191 rejected should use [`encode_checked`].
pub fn encode(
    packet_length: u16,
    sampling_frequency_index: u8,
    channel_config: u8,
    profile: AacProfile,
) -> [u8; ADTS_HEADER_SIZE] {
    let profile_bits = (profile.object_type() - 1) & 0x03;
    let frequency_bits = sampling_frequency_index & 0x0F;
    let channel_bits = channel_config & 0x07;
    let length = packet_length & MAX_ADTS_PACKET_LENGTH;

    [
        0xFF,
        0xF9,
        (profile_bits << 6) | (frequency_bits << 2) | (channel_bits >> 2),
        ((channel_bits & 0x03) << 6) | (length >> 11) as u8,
        ((length >> 3) & 0xFF) as u8,
        (((length & 0x07) as u8) << 5) | 0x1F,
        0xFC,
    ]
}

/// Validating form of [`encode`].
///
/// Fails with `OutOfRange` instead of truncating when the packet length is not
/// in `7..=8191` or a config field does not fit its bit width.
pub fn encode_checked(packet_length: u16, config: &AdtsFrameConfig) -> Result<[u8; ADTS_HEADER_SIZE], FramingError> {
    config.validate().map_err(FramingError::OutOfRange)?;
    if (packet_length as usize) < ADTS_HEADER_SIZE || packet_length > MAX_ADTS_PACKET_LENGTH {
        return Err(FramingError::OutOfRange(format!(
            "ADTS packet length {} outside {}..={}",
            packet_length, ADTS_HEADER_SIZE, MAX_ADTS_PACKET_LENGTH
        )));
    }
    Ok(encode(
        packet_length,
        config.sampling_frequency_index,
        config.channel_config,
        config.profile,
    ))
}

/// Fields read back from an ADTS fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeaderFields {
    pub protection_absent: bool,
    pub profile: AacProfile,
    pub sampling_frequency_index: u8,
    pub channel_config: u8,
    pub frame_length: u16,
}

impl AdtsHeaderFields {
    /// Parse the first 7 bytes of `bytes`. Returns `None` without a sync word.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < ADTS_HEADER_SIZE {
            return None;
        }
        let mut reader = BitReader::endian(bytes, BigEndian);
        Self::read_from(&mut reader).ok().flatten()
    }

    /// Read the fixed header and the frame length field from `reader`.
    ///
    /// Leaves the reader on the buffer fullness field. `Ok(None)` means the
    /// sync word or the profile bits did not match.
    pub fn read_from<R: io::Read>(reader: &mut BitReader<R, BigEndian>) -> io::Result<Option<Self>> {
        if reader.read::<u16>(12)? != ADTS_SYNC_WORD {
            return Ok(None);
        }
        let _mpeg_id = reader.read_bit()?;
        let _layer = reader.read::<u8>(2)?;
        let protection_absent = reader.read_bit()?;
        let profile_bits = reader.read::<u8>(2)?;
        let sampling_frequency_index = reader.read::<u8>(4)?;
        let _private_bit = reader.read_bit()?;
        let channel_config = reader.read::<u8>(3)?;
        // original/copy, home, copyright id bit, copyright id start
        reader.skip(4)?;
        let frame_length = reader.read::<u16>(13)?;

        let Some(profile) = AacProfile::from_object_type(profile_bits + 1) else {
            return Ok(None);
        };
        Ok(Some(Self {
            protection_absent,
            profile,
            sampling_frequency_index,
            channel_config,
            frame_length,
        }))
    }

    /// Header size implied by `protection_absent`: 7 bytes, or 9 with a CRC.
    pub fn header_length(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_SIZE
        } else {
            ADTS_CRC_HEADER_SIZE
        }
    }

    pub fn payload_length(&self) -> usize {
        (self.frame_length as usize).saturating_sub(self.header_length())
    }
}

/// Whether the first 12 bits are the ADTS sync word 0xFFF.
pub fn has_sync_word(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xF0 == 0xF0
}

//! RIFF/WAVE header codec for linear PCM.
//!
//! Generates the canonical 44-byte header (single `fmt ` chunk plus `data`
//! chunk, no extension block, no `fact` chunk) and rewrites it in place once
//! the final payload length of a streamed capture is known.

use std::io::{self, Seek, SeekFrom, Write};

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Bytes counted by the RIFF chunk size in front of the payload.
pub const RIFF_OVERHEAD: u64 = 36;

/// Largest payload the 32-bit RIFF size fields can describe.
pub const MAX_WAV_PAYLOAD: u64 = u32::MAX as u64 - RIFF_OVERHEAD;

/// Encode a 44-byte header for 16-bit PCM.
///
/// Layout (little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    payload + 36
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (fmt chunk size)
/// [20-21]  1 (PCM format tag)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * 2
/// [32-33]  block_align = channels * 2
/// [34-35]  16
/// [36-39]  "data"
/// [40-43]  payload
/// ```
///
/// Total over its inputs: values wider than their field are truncated, and
/// nonsensical inputs such as a zero sample rate still produce 44 bytes.
pub fn encode(payload_byte_count: u64, sample_rate_hz: u32, channel_count: u16) -> [u8; WAV_HEADER_SIZE] {
    encode_with_bit_depth(payload_byte_count, sample_rate_hz, channel_count, 16)
}

/// Encode a 44-byte header for PCM of any whole-byte sample width.
pub fn encode_with_bit_depth(
    payload_byte_count: u64,
    sample_rate_hz: u32,
    channel_count: u16,
    bits_per_sample: u16,
) -> [u8; WAV_HEADER_SIZE] {
    let bytes_per_sample = bits_per_sample / 8;
    let byte_rate = sample_rate_hz
        .wrapping_mul(channel_count as u32)
        .wrapping_mul(bytes_per_sample as u32);
    let block_align = channel_count.wrapping_mul(bytes_per_sample);
    let chunk_size = payload_byte_count.wrapping_add(RIFF_OVERHEAD) as u32;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channel_count.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate_hz.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&(payload_byte_count as u32).to_le_bytes());

    header
}

/// Seek the sink to offset 0 and overwrite the header with the final payload length.
///
/// The sink position is left just past the header.
pub fn rewrite_header_with_final_length<W: Write + Seek>(
    sink: &mut W,
    payload_byte_count: u64,
    sample_rate_hz: u32,
    channel_count: u16,
) -> io::Result<()> {
    rewrite_header(sink, &encode(payload_byte_count, sample_rate_hz, channel_count))
}

pub(crate) fn rewrite_header<W: Write + Seek>(sink: &mut W, header: &[u8; WAV_HEADER_SIZE]) -> io::Result<()> {
    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(header)
}

/// Patch the RIFF chunk size at offset 4 from the total file size.
pub fn patch_file_size(header: &mut [u8], total_file_size: u64) {
    let chunk_size = total_file_size.saturating_sub(8) as u32;
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
}

/// Patch the data-size field at offset 40.
pub fn patch_data_size(header: &mut [u8], data_size: u64) {
    header[40..44].copy_from_slice(&(data_size as u32).to_le_bytes());
}

/// Payload length recorded at offset 40, if the buffer looks like a WAV header.
pub fn data_size(header: &[u8]) -> Option<u32> {
    if header.len() < WAV_HEADER_SIZE || &header[0..4] != b"RIFF" || &header[36..40] != b"data" {
        return None;
    }
    Some(u32::from_le_bytes([header[40], header[41], header[42], header[43]]))
}

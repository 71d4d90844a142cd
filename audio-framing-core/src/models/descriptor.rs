use serde::{Deserialize, Serialize};

/// Format of a linear PCM capture stream.
///
/// Immutable once a capture session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmStreamDescriptor {
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
}

impl PcmStreamDescriptor {
    /// 16-bit PCM descriptor for the given rate and channel count.
    pub fn pcm16(sample_rate_hz: u32, channel_count: u16) -> Self {
        Self {
            sample_rate_hz,
            channel_count,
            bits_per_sample: 16,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.channel_count) {
            return Err(format!("unsupported channel count: {}", self.channel_count));
        }
        if ![8, 16].contains(&self.bits_per_sample) {
            return Err(format!("unsupported bit depth: {}", self.bits_per_sample));
        }
        Ok(())
    }

    /// Bytes per interleaved frame (one sample for every channel).
    pub fn block_align(&self) -> u16 {
        self.channel_count.wrapping_mul(self.bits_per_sample) / 8
    }

    /// Bytes of PCM produced per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate_hz.wrapping_mul(self.block_align() as u32)
    }

    /// Playback duration of `payload_bytes` of PCM in this format.
    pub fn duration_secs(&self, payload_bytes: u64) -> f64 {
        let byte_rate = self.byte_rate();
        if byte_rate == 0 {
            return 0.0;
        }
        payload_bytes as f64 / byte_rate as f64
    }
}

impl Default for PcmStreamDescriptor {
    fn default() -> Self {
        Self::pcm16(44100, 2)
    }
}

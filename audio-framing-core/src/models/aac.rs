use serde::{Deserialize, Serialize};

use crate::processing::adts_format;

/// AAC audio object types that fit the 2-bit ADTS profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AacProfile {
    Main,
    #[default]
    Lc,
    Ssr,
    Ltp,
}

impl AacProfile {
    /// MPEG-4 audio object type (AAC LC = 2).
    pub fn object_type(&self) -> u8 {
        match self {
            Self::Main => 1,
            Self::Lc => 2,
            Self::Ssr => 3,
            Self::Ltp => 4,
        }
    }

    pub fn from_object_type(object_type: u8) -> Option<Self> {
        match object_type {
            1 => Some(Self::Main),
            2 => Some(Self::Lc),
            3 => Some(Self::Ssr),
            4 => Some(Self::Ltp),
            _ => None,
        }
    }
}

/// Stream-level parameters written into every ADTS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdtsFrameConfig {
    pub profile: AacProfile,
    /// 4-bit sampling frequency table index (4 = 44100 Hz).
    pub sampling_frequency_index: u8,
    /// 3-bit channel configuration (2 = stereo pair).
    pub channel_config: u8,
}

impl AdtsFrameConfig {
    /// Config for a concrete sample rate, or `None` if the rate has no table entry.
    pub fn for_sample_rate(sample_rate_hz: u32, channel_config: u8) -> Option<Self> {
        let sampling_frequency_index = adts_format::sampling_frequency_index(sample_rate_hz)?;
        Some(Self {
            profile: AacProfile::Lc,
            sampling_frequency_index,
            channel_config,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sampling_frequency_index > 0x0F {
            return Err(format!(
                "sampling frequency index {} does not fit in 4 bits",
                self.sampling_frequency_index
            ));
        }
        if self.channel_config > 0x07 {
            return Err(format!(
                "channel config {} does not fit in 3 bits",
                self.channel_config
            ));
        }
        Ok(())
    }

    /// Sample rate for the configured index, if it is a standard one.
    pub fn sample_rate_hz(&self) -> Option<u32> {
        adts_format::sampling_frequency(self.sampling_frequency_index)
    }
}

impl Default for AdtsFrameConfig {
    fn default() -> Self {
        Self {
            profile: AacProfile::Lc,
            sampling_frequency_index: 4,
            channel_config: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lc_is_object_type_two() {
        assert_eq!(AacProfile::Lc.object_type(), 2);
        assert_eq!(AacProfile::default(), AacProfile::Lc);
        assert_eq!(AacProfile::from_object_type(4), Some(AacProfile::Ltp));
        assert_eq!(AacProfile::from_object_type(5), None);
    }

    #[test]
    fn config_from_sample_rate() {
        let config = AdtsFrameConfig::for_sample_rate(44100, 2).unwrap();
        assert_eq!(config, AdtsFrameConfig::default());
        assert_eq!(config.sample_rate_hz(), Some(44100));

        let config = AdtsFrameConfig::for_sample_rate(16000, 1).unwrap();
        assert_eq!(config.sampling_frequency_index, 8);

        assert!(AdtsFrameConfig::for_sample_rate(44000, 2).is_none());
    }

    #[test]
    fn validate_field_widths() {
        assert!(AdtsFrameConfig::default().validate().is_ok());

        let wide_index = AdtsFrameConfig {
            sampling_frequency_index: 16,
            ..Default::default()
        };
        assert!(wide_index.validate().is_err());

        let wide_channels = AdtsFrameConfig {
            channel_config: 8,
            ..Default::default()
        };
        assert!(wide_channels.validate().is_err());
    }
}

use std::path::PathBuf;
use std::time::Duration;

use super::descriptor::PcmStreamDescriptor;

/// Configuration for a recording session.
#[derive(Debug, Clone)]
pub struct RecordingConfiguration {
    /// Format of the captured PCM stream (default: 44100 Hz, stereo, 16-bit).
    pub descriptor: PcmStreamDescriptor,

    /// Directory where recording files are written.
    pub output_directory: PathBuf,

    /// File name stem shared by the `.wav`, `.pcm` and sidecar files.
    /// None generates `recording_<uuid>`.
    pub file_stem: Option<String>,

    /// Also write the raw PCM payload to a sibling `.pcm` file (default: false).
    pub mirror_raw_pcm: bool,

    /// Write a `.metadata.json` sidecar after finalizing (default: true).
    pub write_metadata_sidecar: bool,

    /// Size of the buffer handed to the source on each read, in bytes.
    pub chunk_size_bytes: usize,

    /// How long the producer sleeps when the source has nothing ready.
    pub poll_interval: Duration,
}

impl RecordingConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        self.descriptor.validate()?;
        if self.chunk_size_bytes == 0 {
            return Err("chunk size must be positive".into());
        }
        let block_align = self.descriptor.block_align() as usize;
        if self.chunk_size_bytes % block_align != 0 {
            return Err(format!(
                "chunk size {} is not a multiple of the {}-byte frame",
                self.chunk_size_bytes, block_align
            ));
        }
        if let Some(stem) = &self.file_stem {
            if stem.is_empty() || stem.contains(['/', '\\']) {
                return Err(format!("invalid file stem: {:?}", stem));
            }
        }
        Ok(())
    }

    /// Resolved file stem, generating one if none was configured.
    pub fn resolve_file_stem(&self) -> String {
        match &self.file_stem {
            Some(stem) => stem.clone(),
            None => format!("recording_{}", uuid::Uuid::new_v4()),
        }
    }
}

impl Default for RecordingConfiguration {
    fn default() -> Self {
        Self {
            descriptor: PcmStreamDescriptor::default(),
            output_directory: PathBuf::from("."),
            file_stem: None,
            mirror_raw_pcm: false,
            write_metadata_sidecar: true,
            chunk_size_bytes: 4096,
            poll_interval: Duration::from_millis(10),
        }
    }
}

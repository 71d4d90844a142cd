use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::descriptor::PcmStreamDescriptor;

/// Result returned when a recording session completes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub wav_path: PathBuf,
    /// Raw PCM mirror, when enabled.
    pub pcm_path: Option<PathBuf>,
    pub payload_bytes: u64,
    pub duration_secs: f64,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a finished recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub checksum: String,
    pub format: PcmStreamDescriptor,
    pub payload_bytes: u64,
    pub duration_secs: f64,
}

impl RecordingMetadata {
    pub fn new(
        file_path: &str,
        checksum: &str,
        format: PcmStreamDescriptor,
        payload_bytes: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            format,
            payload_bytes,
            duration_secs: format.duration_secs(payload_bytes),
        }
    }
}

//! # audio-framing-core
//!
//! Platform-agnostic audio framing core library.
//!
//! Provides the RIFF/WAVE header codec for streaming PCM capture, the ADTS
//! header codec for raw AAC access units, streaming container writers, and a
//! recording session that drives a capture source on a producer thread.
//! Device backends (microphones, hardware encoders) implement the `PcmSource`
//! and `AccessUnitSource` traits and plug into the generic orchestration.
//!
//! ## Architecture
//!
//! ```text
//! audio-framing-core (this crate)
//! ├── traits/       ← PcmSource, AccessUnitSource
//! ├── models/       ← FramingError, PcmStreamDescriptor, AdtsFrameConfig, states, config
//! ├── processing/   ← WAV and ADTS header codecs, PCM sample conversion
//! ├── session/      ← RecordingSession, ADTS export
//! └── storage/      ← StreamingWavWriter, AdtsFrameWriter, file helpers, metadata
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::aac::{AacProfile, AdtsFrameConfig};
pub use models::config::RecordingConfiguration;
pub use models::descriptor::PcmStreamDescriptor;
pub use models::error::FramingError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{SessionState, WriterState};
pub use processing::adts_format::AdtsHeaderFields;
pub use session::aac_export::{export_adts_file, export_adts_stream, AdtsExportSummary};
pub use session::recording::RecordingSession;
pub use storage::adts_writer::{write_frame, AdtsFrameWriter};
pub use storage::wav_writer::StreamingWavWriter;
pub use traits::access_unit_source::AccessUnitSource;
pub use traits::pcm_source::{MemoryPcmSource, PcmSource, SourceRead};

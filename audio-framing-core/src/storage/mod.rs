pub mod adts_writer;
pub mod file_output;
pub mod metadata;
pub mod wav_writer;

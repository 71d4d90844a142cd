pub mod adts_format;
pub mod pcm;
pub mod wav_format;

pub mod aac_export;
pub mod recording;

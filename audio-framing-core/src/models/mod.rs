pub mod aac;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod recording_result;
pub mod state;

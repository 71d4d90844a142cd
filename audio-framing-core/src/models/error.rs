use std::fmt;
use std::io;

use thiserror::Error;

/// Errors that can occur while framing, writing, or recording audio.
#[derive(Debug, Error)]
pub enum FramingError {
    /// An operation was called out of sequence. Non-retryable; indicates a caller bug.
    #[error("invalid state: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    /// Failure reported by the sink or source, propagated verbatim.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl FramingError {
    pub(crate) fn invalid_state(operation: &'static str, state: impl fmt::Display) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

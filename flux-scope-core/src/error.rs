//! Errors raised by the fallible builder and configuration surfaces
//!
//! Dispatch itself never fails: foreign envelopes and unmatched actions are
//! skipped silently.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FluxError>;

#[derive(Debug, Error)]
pub enum FluxError {
    #[error("unknown action type `{0}`")]
    UnknownAction(String),

    #[error("payload for action `{action}` does not match its registered type")]
    PayloadMismatch { action: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

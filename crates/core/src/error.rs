//! Centralized error types for the ethscan workspace.

use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EthscanError {
    /// Network failure, non-2xx status, or an undecodable JSON body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The payload parsed as JSON but does not have the block-array shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EthscanError {
    /// Errors that abort one refresh cycle but leave the scheduler running.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::MalformedPayload(_))
    }
}

pub type EthscanResult<T> = Result<T, EthscanError>;

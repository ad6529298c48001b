//! PipeWire error types.

use std::time::Duration;

use thiserror::Error;

/// PipeWire error type.
#[derive(Debug, Error)]
pub enum PwError {
    #[error("PipeWire connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Node creation failed: {0}")]
    NodeCreationFailed(String),

    #[error("Link creation failed: {0}")]
    LinkCreationFailed(String),

    #[error("Registry error: {0}")]
    RegistryError(String),

    #[error("MainLoop error: {0}")]
    MainLoopError(String),

    #[error("PipeWire runtime is not running")]
    Disconnected,

    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: &'static str, timeout: Duration },
}

/// Result type for PipeWire operations.
pub type PwResult<T> = Result<T, PwError>;

impl From<PwError> for venmic_core::Error {
    fn from(err: PwError) -> Self {
        match err {
            PwError::Timeout { operation, timeout } => Self::ServerTimeout { operation, timeout },
            other => Self::ServerUnavailable(other.to_string()),
        }
    }
}

//! Error types for venmic.

use std::time::Duration;

use thiserror::Error;

/// Core error type for patchbay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No connection to the graph server could be made, or it was lost.
    #[error("PipeWire unavailable: {0}")]
    ServerUnavailable(String),

    /// The graph server did not answer in time. Retryable.
    #[error("PipeWire did not answer {operation} within {timeout:?}")]
    ServerTimeout {
        /// Operation that was waiting
        operation: &'static str,
        /// Bound that expired
        timeout: Duration,
    },

    /// The rule was rejected before the graph was touched.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// The server refused to link one node into the target.
    #[error("Failed to link node {node}: {reason}")]
    LinkCreationFailed { node: u32, reason: String },

    /// An owned link could not be destroyed. `link` is `None` when the
    /// server never reported an id for it.
    #[error("Failed to remove link {}: {reason}", link.map_or_else(|| "(unconfirmed)".to_string(), |id| id.to_string()))]
    LinkRemovalFailed { link: Option<u32>, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for venmic core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_failure_names_link() {
        let known = Error::LinkRemovalFailed { link: Some(42), reason: "busy".to_string() };
        let unknown = Error::LinkRemovalFailed { link: None, reason: "timed out".to_string() };

        assert_eq!(known.to_string(), "Failed to remove link 42: busy");
        assert_eq!(unknown.to_string(), "Failed to remove link (unconfirmed): timed out");
    }
}

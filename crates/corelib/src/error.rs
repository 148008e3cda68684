//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors that can occur while routing, joining or serving ring operations.
///
/// Lock contention, missing keys and malformed load lines are not errors;
/// they resolve into ordinary return values.
#[derive(Debug, Error)]
pub enum RingError {
    /// A peer could not be reached (refused, reset, timed out, unknown).
    #[error("node {node} unavailable: {reason}")]
    Unavailable { node: String, reason: String },

    /// The peer was reached but the operation failed on its side.
    #[error("remote failure: {0}")]
    Remote(String),

    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The operation is not valid in the node's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RingError {
    /// Shorthand for an unreachable peer.
    pub fn unavailable(node: impl Into<String>, reason: impl Into<String>) -> Self {
        RingError::Unavailable {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// True for failures a caller may retry once the ring settles.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RingError::Unavailable { .. })
    }
}

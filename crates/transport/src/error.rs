use corelib::RingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} to {addr} timed out after {timeout_ms}ms")]
    Timeout {
        addr: String,
        op: &'static str,
        timeout_ms: u64,
    },

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("frame too large: {size} bytes (max {max_size})")]
    FrameTooLarge { size: usize, max_size: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse {
        expected: &'static str,
        got: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

impl From<bincode::Error> for TransportError {
    fn from(e: bincode::Error) -> Self {
        TransportError::Serialization(e.to_string())
    }
}

impl TransportError {
    /// Converts into the ring's error type, naming the peer that failed.
    ///
    /// Anything that keeps the request from being answered counts as the
    /// peer being unavailable. Garbled frames are codec errors.
    pub fn into_ring_error(self, node: &str) -> RingError {
        match self {
            TransportError::Serialization(msg) => RingError::Codec(msg),
            e @ TransportError::FrameTooLarge { .. } => RingError::Codec(e.to_string()),
            e @ TransportError::UnexpectedResponse { .. } => RingError::Remote(e.to_string()),
            e => RingError::unavailable(node, e.to_string()),
        }
    }
}

impl From<TransportError> for RingError {
    fn from(e: TransportError) -> Self {
        e.into_ring_error("unknown")
    }
}

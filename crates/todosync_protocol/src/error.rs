//! Error types for protocol encoding and decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload was not valid JSON or did not match the message shape.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A message could not be serialized.
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

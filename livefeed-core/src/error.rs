//! Error types for livefeed wire operations.

use thiserror::Error;

/// Core error type for frame encoding and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Inbound frame is not a valid envelope.
    #[error("malformed frame: {source}")]
    MalformedFrame {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Envelope payload does not match the message shape for its kind.
    #[error("payload mismatch for kind {kind}: {source}")]
    PayloadMismatch {
        /// Kind of the envelope whose payload failed to decode.
        kind: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Outbound envelope could not be serialized.
    #[error("encode failed: {source}")]
    Encode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for livefeed core operations.
pub type Result<T> = std::result::Result<T, Error>;

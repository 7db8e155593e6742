//! Error types for client operations.

use thiserror::Error;

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configured origin is not a valid URL.
    #[error("invalid endpoint origin {url}: {source}")]
    InvalidEndpoint {
        /// The origin string that failed to parse.
        url: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// Configured origin uses a scheme with no streaming equivalent.
    #[error("unsupported origin scheme: {scheme}")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// WebSocket transport error.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection timeout.
    #[error("connection timeout")]
    ConnectTimeout,

    /// Connection closed by server.
    #[error("connection closed")]
    ConnectionClosed,

    /// Maximum reconnect attempts reached.
    #[error("maximum reconnect attempts reached")]
    MaxReconnectAttempts,
}

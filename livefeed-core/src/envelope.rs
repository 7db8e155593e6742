//! The envelope wrapper exchanged on every feed frame.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kind discriminants.
///
/// Unknown kinds are valid on the wire; consumers log and drop them.
pub mod kind {
    /// Personal notification for the authenticated user.
    pub const NOTIFICATION: &str = "NOTIFICATION";
    /// System-wide broadcast, delivered as a notification.
    pub const BROADCAST: &str = "BROADCAST";
    /// New comment on a post.
    pub const COMMENT: &str = "COMMENT";
    /// Outbound control frame registering topic interest.
    pub const SUBSCRIBE: &str = "SUBSCRIBE";
    /// Outbound control frame withdrawing topic interest.
    pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";
}

/// Uniform wrapper for every frame exchanged over the feed connection.
///
/// The `kind` discriminant selects the payload shape; the payload itself
/// stays opaque until a consumer asks for a typed view via
/// [`Envelope::payload_as`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Discriminant identifying the payload shape and dispatch target.
    pub kind: String,
    /// Opaque JSON payload, decoded lazily per kind.
    pub payload: Value,
    /// Wall-clock time the frame was produced.
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Creates an envelope with the given kind and payload, stamped now.
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Creates a topic control envelope (`SUBSCRIBE`/`UNSUBSCRIBE`).
    #[must_use]
    pub fn control(kind: &str, topic: &str) -> Self {
        Self::new(kind, serde_json::json!({ "topic": topic }))
    }

    /// Decodes a raw text frame into an envelope.
    ///
    /// # Errors
    /// Returns [`Error::MalformedFrame`] if the frame is not valid JSON or
    /// does not carry the envelope shape (a missing `kind` is malformed).
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(|source| Error::MalformedFrame { source })
    }

    /// Serializes the envelope into a text frame.
    ///
    /// # Errors
    /// Returns [`Error::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| Error::Encode { source })
    }

    /// Decodes the payload as the typed message for this envelope's kind.
    ///
    /// # Errors
    /// Returns [`Error::PayloadMismatch`] if the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|source| Error::PayloadMismatch {
            kind: self.kind.clone(),
            source,
        })
    }
}

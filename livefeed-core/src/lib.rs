//! # Livefeed Core
//!
//! Wire types for the livefeed realtime messaging protocol.
//!
//! This crate provides:
//! - The `Envelope` wrapper exchanged on every frame
//! - Message kind discriminants and control-frame constructors
//! - Typed payloads for notification and comment messages
//! - Error types for frame decoding

pub mod envelope;
pub mod error;
pub mod message;

pub use envelope::{Envelope, kind};
pub use error::{Error, Result};
pub use message::{CommentAuthor, CommentMessage, CommentPost, NotificationMessage};

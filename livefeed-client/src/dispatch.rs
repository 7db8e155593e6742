//! Routes decoded envelopes to typed buffers and observers.

use crate::observer::FeedObserver;
use crate::state::FeedState;
use livefeed_core::{CommentMessage, Envelope, NotificationMessage, kind};
use std::sync::Arc;

/// Dispatcher that routes inbound frames by envelope kind.
///
/// Dispatch mutates the shared buffers and invokes observers; it performs
/// no network I/O. Unknown kinds are logged and dropped.
pub struct Dispatcher {
    state: Arc<FeedState>,
    observers: Vec<Arc<dyn FeedObserver>>,
}

impl Dispatcher {
    /// Creates a dispatcher over the shared state and observer list.
    #[must_use]
    pub fn new(state: Arc<FeedState>, observers: Vec<Arc<dyn FeedObserver>>) -> Self {
        Self { state, observers }
    }

    /// Decodes a raw text frame and dispatches it.
    ///
    /// Malformed frames are logged and dropped; they never affect
    /// connection state.
    pub fn handle_frame(&self, frame: &str) {
        match Envelope::decode(frame) {
            Ok(envelope) => self.dispatch(envelope),
            Err(e) => tracing::warn!("Dropping malformed frame: {}", e),
        }
    }

    /// Routes a decoded envelope to its sink.
    pub fn dispatch(&self, envelope: Envelope) {
        match envelope.kind.as_str() {
            kind::NOTIFICATION | kind::BROADCAST => {
                match envelope.payload_as::<NotificationMessage>() {
                    Ok(notification) => {
                        self.state.push_notification(notification.clone());
                        for observer in &self.observers {
                            observer.on_notification(&notification);
                        }
                    }
                    Err(e) => tracing::warn!("Dropping {} frame: {}", envelope.kind, e),
                }
            }
            kind::COMMENT => match envelope.payload_as::<CommentMessage>() {
                Ok(comment) => {
                    self.state.push_comment(comment.clone());
                    for observer in &self.observers {
                        observer.on_comment(&comment);
                    }
                }
                Err(e) => tracing::warn!("Dropping {} frame: {}", envelope.kind, e),
            },
            other => tracing::debug!("Unknown message kind: {}", other),
        }
    }

    /// Marks the connection established and notifies observers.
    pub fn mark_connected(&self) {
        self.state.set_connected(true);
        for observer in &self.observers {
            observer.on_connect();
        }
    }

    /// Marks the connection lost and notifies observers.
    pub fn mark_disconnected(&self) {
        self.state.set_connected(false);
        for observer in &self.observers {
            observer.on_disconnect();
        }
    }
}

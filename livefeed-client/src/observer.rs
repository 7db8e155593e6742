//! Observer hooks for connection lifecycle and message events.

use livefeed_core::{CommentMessage, NotificationMessage};

/// Trait for observing feed lifecycle and inbound messages.
///
/// All methods have empty default implementations; implementors override
/// only the events they care about. Any number of observers can be
/// registered on a client, and each is invoked at most once per event.
pub trait FeedObserver: Send + Sync {
    /// Called when the connection is established.
    fn on_connect(&self) {}

    /// Called when the connection is lost or closed.
    fn on_disconnect(&self) {}

    /// Called for each notification or broadcast message.
    fn on_notification(&self, _notification: &NotificationMessage) {}

    /// Called for each comment message.
    fn on_comment(&self, _comment: &CommentMessage) {}
}

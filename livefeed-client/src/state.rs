//! Shared reactive state readable by UI and state layers.

use livefeed_core::{CommentMessage, NotificationMessage};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connection flag and message buffers shared between the client task and
/// external readers.
///
/// Buffers are newest-first and capped at the configured retention; once a
/// buffer is full, the oldest entries are dropped.
pub struct FeedState {
    connected: AtomicBool,
    retention: usize,
    notifications: RwLock<VecDeque<NotificationMessage>>,
    comments: RwLock<VecDeque<CommentMessage>>,
}

impl FeedState {
    /// Creates feed state with the given per-buffer retention cap.
    #[must_use]
    pub fn new(retention: usize) -> Self {
        Self {
            connected: AtomicBool::new(false),
            retention,
            notifications: RwLock::new(VecDeque::new()),
            comments: RwLock::new(VecDeque::new()),
        }
    }

    /// Returns true while the underlying connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn push_notification(&self, notification: NotificationMessage) {
        let mut buffer = self.notifications.write();
        buffer.push_front(notification);
        buffer.truncate(self.retention);
    }

    pub(crate) fn push_comment(&self, comment: CommentMessage) {
        let mut buffer = self.comments.write();
        buffer.push_front(comment);
        buffer.truncate(self.retention);
    }

    /// Snapshot of buffered notifications, newest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<NotificationMessage> {
        self.notifications.read().iter().cloned().collect()
    }

    /// Snapshot of buffered comments, newest first.
    #[must_use]
    pub fn comments(&self) -> Vec<CommentMessage> {
        self.comments.read().iter().cloned().collect()
    }
}

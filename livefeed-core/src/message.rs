//! Typed payloads carried by the feed envelopes.
//!
//! Field names follow the server's camelCase JSON convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-facing notification, delivered by the `NOTIFICATION` and
/// `BROADCAST` kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    /// Server-assigned notification ID.
    pub id: i64,
    /// Short title shown in notification lists.
    pub title: String,
    /// Notification body text.
    pub content: String,
    /// Notification category (e.g. `POST_COMMENT`, `SYSTEM_NOTIFICATION`).
    #[serde(rename = "type")]
    pub kind: String,
    /// ID of the user this notification targets.
    pub recipient_id: String,
    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

/// A comment event, delivered by the `COMMENT` kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMessage {
    /// Server-assigned comment ID.
    pub id: i64,
    /// Comment body text.
    pub content: String,
    /// The user who wrote the comment.
    pub author: CommentAuthor,
    /// The post the comment belongs to.
    pub post: CommentPost,
    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

/// Author reference embedded in a comment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    /// Author's user ID.
    pub id: i64,
    /// Author's display name.
    pub username: String,
}

/// Post reference embedded in a comment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPost {
    /// Post ID.
    pub id: i64,
    /// Post title.
    pub title: String,
}

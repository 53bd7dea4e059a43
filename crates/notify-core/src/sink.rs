//! Notification display boundary.

use serde::Serialize;

use crate::error::SinkError;
use crate::types::{ConversationId, MessageId};

/// A rolled-up notification for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryNotification {
    /// Conversation the notification belongs to; at most one is visible per key.
    pub key: ConversationId,
    pub title: String,
    /// Text shown when the notification is collapsed.
    pub collapsed_text: String,
    /// Expanded lines, oldest first.
    pub lines: Vec<String>,
    /// Number of pending messages not listed in `lines`.
    pub more_count: usize,
    /// Rendered "+N more" line, present when `more_count > 0`.
    pub summary_text: Option<String>,
    /// Newest message, used as the click-through target.
    pub latest_message_id: MessageId,
}

/// Displays and removes notifications, e.g. an OS notification center.
///
/// `upsert` replaces any notification previously shown under the same key.
pub trait NotificationSink: Send + Sync {
    fn upsert(&self, notification: &SummaryNotification) -> Result<(), SinkError>;

    fn cancel(&self, key: &ConversationId) -> Result<(), SinkError>;

    fn cancel_all(&self) -> Result<(), SinkError>;
}

//! Persistence boundary for watermarks, pending entries and the disabled set.

use notify_db::{Database, DisabledTarget, PendingMap, StoredEntry};

use crate::error::StoreError;
use crate::types::{ConversationId, MessageId, PendingEntry, Position, UNSEEN};

/// Key-value persistence used by the aggregator.
///
/// Implementations must make `insert_pending` and `advance_watermark`
/// atomic for a single conversation. Callers already serialize access per
/// conversation, so nothing stronger is required.
pub trait NotificationStore: Send + Sync {
    /// Highest seen position, [`UNSEEN`] when nothing was recorded.
    fn watermark(&self, conversation: &ConversationId) -> Result<Position, StoreError>;

    /// Raise the watermark to `position` if higher; returns the stored value.
    fn advance_watermark(
        &self,
        conversation: &ConversationId,
        position: Position,
    ) -> Result<Position, StoreError>;

    /// Pending entries in arrival order.
    fn pending(&self, conversation: &ConversationId) -> Result<Vec<PendingEntry>, StoreError>;

    /// Insert unless the message ID is already pending. Returns `true` on insert.
    fn insert_pending(
        &self,
        conversation: &ConversationId,
        entry: &PendingEntry,
    ) -> Result<bool, StoreError>;

    /// Replace all pending entries, keeping the given order as arrival order.
    fn replace_pending(
        &self,
        conversation: &ConversationId,
        entries: &[PendingEntry],
    ) -> Result<(), StoreError>;

    fn remove_pending(&self, conversation: &ConversationId) -> Result<(), StoreError>;

    /// Whether `target` is in the disabled set; `None` is the global switch,
    /// which is independent of every conversation entry.
    fn is_disabled(&self, target: Option<&ConversationId>) -> Result<bool, StoreError>;

    fn set_disabled(
        &self,
        target: Option<&ConversationId>,
        disabled: bool,
    ) -> Result<(), StoreError>;
}

fn disabled_target(target: Option<&ConversationId>) -> DisabledTarget<'_> {
    match target {
        Some(c) => DisabledTarget::Conversation(c.as_str()),
        None => DisabledTarget::All,
    }
}

impl NotificationStore for Database {
    fn watermark(&self, conversation: &ConversationId) -> Result<Position, StoreError> {
        Ok(self.get_position(conversation.as_str())?.unwrap_or(UNSEEN))
    }

    fn advance_watermark(
        &self,
        conversation: &ConversationId,
        position: Position,
    ) -> Result<Position, StoreError> {
        Ok(self.advance_position(conversation.as_str(), position)?)
    }

    fn pending(&self, conversation: &ConversationId) -> Result<Vec<PendingEntry>, StoreError> {
        let mut stored: Vec<_> = self.get_pending(conversation.as_str())?.into_iter().collect();
        stored.sort_by_key(|(_, entry)| entry.seq);
        Ok(stored
            .into_iter()
            .map(|(id, entry)| PendingEntry {
                message_id: MessageId::from(id),
                position: entry.position,
                text: entry.text,
            })
            .collect())
    }

    fn insert_pending(
        &self,
        conversation: &ConversationId,
        entry: &PendingEntry,
    ) -> Result<bool, StoreError> {
        let stored = StoredEntry {
            position: entry.position,
            text: entry.text.clone(),
            seq: 0,
        };
        Ok(self.insert_pending_if_absent(conversation.as_str(), entry.message_id.as_str(), &stored)?)
    }

    fn replace_pending(
        &self,
        conversation: &ConversationId,
        entries: &[PendingEntry],
    ) -> Result<(), StoreError> {
        let map: PendingMap = entries
            .iter()
            .enumerate()
            .map(|(seq, entry)| {
                (
                    entry.message_id.to_string(),
                    StoredEntry {
                        position: entry.position,
                        text: entry.text.clone(),
                        seq: seq as u64,
                    },
                )
            })
            .collect();
        Ok(self.put_pending(conversation.as_str(), &map)?)
    }

    fn remove_pending(&self, conversation: &ConversationId) -> Result<(), StoreError> {
        Ok(Database::remove_pending(self, conversation.as_str())?)
    }

    fn is_disabled(&self, target: Option<&ConversationId>) -> Result<bool, StoreError> {
        Ok(Database::is_disabled(self, disabled_target(target))?)
    }

    fn set_disabled(
        &self,
        target: Option<&ConversationId>,
        disabled: bool,
    ) -> Result<(), StoreError> {
        Ok(Database::set_disabled(self, disabled_target(target), disabled)?)
    }
}

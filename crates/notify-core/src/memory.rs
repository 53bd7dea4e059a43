//! In-process store for tests and hosts that do not need persistence.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::{DashMap, DashSet};

use crate::error::StoreError;
use crate::store::NotificationStore;
use crate::types::{ConversationId, PendingEntry, Position, UNSEEN};

/// [`NotificationStore`] backed by `DashMap`s.
///
/// Writes can be made to fail with [`MemoryStore::set_fail_writes`], which
/// lets callers exercise the aggregator's persistence-failure path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    watermarks: DashMap<ConversationId, Position>,
    pending: DashMap<ConversationId, Vec<PendingEntry>>,
    all_disabled: AtomicBool,
    disabled: DashSet<ConversationId>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl NotificationStore for MemoryStore {
    fn watermark(&self, conversation: &ConversationId) -> Result<Position, StoreError> {
        Ok(self
            .watermarks
            .get(conversation)
            .map(|w| *w)
            .unwrap_or(UNSEEN))
    }

    fn advance_watermark(
        &self,
        conversation: &ConversationId,
        position: Position,
    ) -> Result<Position, StoreError> {
        self.check_writable()?;
        let mut stored = self.watermarks.entry(conversation.clone()).or_insert(UNSEEN);
        *stored = (*stored).max(position);
        Ok(*stored)
    }

    fn pending(&self, conversation: &ConversationId) -> Result<Vec<PendingEntry>, StoreError> {
        Ok(self
            .pending
            .get(conversation)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    fn insert_pending(
        &self,
        conversation: &ConversationId,
        entry: &PendingEntry,
    ) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut entries = self.pending.entry(conversation.clone()).or_default();
        if entries.iter().any(|e| e.message_id == entry.message_id) {
            return Ok(false);
        }
        entries.push(entry.clone());
        Ok(true)
    }

    fn replace_pending(
        &self,
        conversation: &ConversationId,
        entries: &[PendingEntry],
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        if entries.is_empty() {
            self.pending.remove(conversation);
        } else {
            self.pending.insert(conversation.clone(), entries.to_vec());
        }
        Ok(())
    }

    fn remove_pending(&self, conversation: &ConversationId) -> Result<(), StoreError> {
        self.check_writable()?;
        self.pending.remove(conversation);
        Ok(())
    }

    fn is_disabled(&self, target: Option<&ConversationId>) -> Result<bool, StoreError> {
        Ok(match target {
            Some(c) => self.disabled.contains(c),
            None => self.all_disabled.load(Ordering::SeqCst),
        })
    }

    fn set_disabled(
        &self,
        target: Option<&ConversationId>,
        disabled: bool,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        match target {
            Some(c) if disabled => {
                self.disabled.insert(c.clone());
            }
            Some(c) => {
                self.disabled.remove(c);
            }
            None => self.all_disabled.store(disabled, Ordering::SeqCst),
        }
        Ok(())
    }
}

//! Per-conversation mutual exclusion.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::types::ConversationId;

/// One mutex per conversation, created on first use.
///
/// Work for different conversations runs concurrently; work for the same
/// conversation is serialized. The map's shard guard is released before
/// blocking on a conversation mutex.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with<R>(&self, key: &ConversationId, f: impl FnOnce() -> R) -> R {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        // A panic in another holder leaves no state behind the unit mutex.
        let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Drop mutexes nobody is waiting on or holding.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

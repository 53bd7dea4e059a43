//! The notification aggregator.
//!
//! Notifications are grouped by conversation: every conversation has at most
//! one visible summary, rebuilt from its pending entries whenever a new
//! message is accepted. Opening (clearing) a conversation folds the pending
//! entries into its watermark so older messages are never shown again.
//!
//! Clears are applied by a background worker fed from a bounded queue. The
//! cutoff of each clear is fixed when it is requested, so a message accepted
//! after the request survives it.

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};

use crate::locks::KeyedLocks;
use crate::queue::{ClearJob, ClearQueue, QUEUE_CAPACITY};
use crate::sink::NotificationSink;
use crate::store::NotificationStore;
use crate::summary::{SummaryStrings, render_summary};
use crate::title::TitleResolver;
use crate::types::{ConversationId, MessageId, PendingEntry, Position, UNSEEN};

/// Default number of expanded lines per summary.
pub const DEFAULT_MAX_LINES: usize = 5;

/// What [`Aggregator::add`] does while notifications are disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuppressedPolicy {
    /// Ignore the message entirely.
    #[default]
    Drop,
    /// Record the message as pending but do not display it.
    Record,
}

impl SuppressedPolicy {
    pub fn from_str_setting(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "record" => Self::Record,
            _ => Self::Drop,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub max_lines: usize,
    pub suppressed: SuppressedPolicy,
    pub strings: SummaryStrings,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            suppressed: SuppressedPolicy::default(),
            strings: SummaryStrings::default(),
        }
    }
}

/// Result of [`Aggregator::add`]. Informational only; none of these are errors
/// for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Recorded and the summary was dispatched.
    Added,
    /// At or below the conversation's watermark.
    Stale,
    /// Message ID already pending.
    Duplicate,
    /// Notifications are disabled; recorded only under [`SuppressedPolicy::Record`].
    Suppressed,
    /// The store could not be read or written. Logged.
    Failed,
}

/// Cloneable handle; clones share state.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn NotificationStore>,
    sink: Arc<dyn NotificationSink>,
    titles: Arc<dyn TitleResolver>,
    config: AggregatorConfig,
    locks: KeyedLocks,
    queue: ClearQueue,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        sink: Arc<dyn NotificationSink>,
        titles: Arc<dyn TitleResolver>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                sink,
                titles,
                config,
                locks: KeyedLocks::new(),
                queue: ClearQueue::default(),
            }),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.inner.config
    }

    /// `true` unless notifications are disabled globally.
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled_for(None)
    }

    /// `true` unless notifications are disabled for `conversation`.
    /// Without a conversation this is [`Aggregator::is_enabled`].
    pub fn is_conversation_enabled(&self, conversation: Option<&ConversationId>) -> bool {
        match conversation {
            Some(c) => self.inner.enabled_for(Some(c)),
            None => self.is_enabled(),
        }
    }

    /// Enable or disable all notifications. Disabling cancels everything shown.
    pub fn set_enabled(&self, enabled: bool) {
        let inner = &self.inner;
        if let Err(e) = inner.store.set_disabled(None, !enabled) {
            tracing::error!(enabled, "Failed to persist global notification setting: {e}");
        }
        if !enabled {
            if let Err(e) = inner.sink.cancel_all() {
                tracing::error!("Failed to cancel notifications: {e}");
            }
        }
        tracing::info!(enabled, "Notifications toggled");
    }

    /// Enable or disable notifications for one conversation. Disabling cancels
    /// its visible summary.
    pub fn set_conversation_enabled(&self, conversation: &ConversationId, enabled: bool) {
        let inner = &self.inner;
        inner.locks.with(conversation, || {
            if let Err(e) = inner.store.set_disabled(Some(conversation), !enabled) {
                tracing::error!(
                    conversation = %conversation,
                    enabled,
                    "Failed to persist conversation notification setting: {e}"
                );
            }
            if !enabled {
                inner.cancel(conversation);
            }
        });
        tracing::debug!(conversation = %conversation, enabled, "Conversation notifications toggled");
    }

    /// Record a new message and refresh the conversation's summary.
    ///
    /// Messages at or below the watermark and message IDs already pending are
    /// ignored. Calls for the same conversation are serialized.
    pub fn add(
        &self,
        conversation: &ConversationId,
        message_id: &MessageId,
        position: Position,
        text: &str,
    ) -> AddOutcome {
        let inner = &self.inner;
        inner
            .locks
            .with(conversation, || inner.add_locked(conversation, message_id, position, text))
    }

    /// Start the background clear worker on the current Tokio runtime.
    ///
    /// Without a worker (or outside a runtime) [`Aggregator::clear`] runs
    /// inline.
    pub fn start_clear_worker(&self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("No Tokio runtime, clears will run inline: {e}");
                return;
            }
        };
        let (tx, rx) = mpsc::channel::<ClearJob>(QUEUE_CAPACITY);
        let worker = handle.spawn(clear_worker(Arc::downgrade(&self.inner), rx));
        if self.inner.queue.attach(tx, worker) {
            tracing::info!("Clear worker started");
        } else {
            tracing::warn!("Clear worker already running");
        }
    }

    /// Mark everything pending as seen and remove the visible summary.
    ///
    /// Only the cutoff is taken here; the writes and the cancel happen on the
    /// clear worker. Use [`Aggregator::flush`] to wait for them.
    pub fn clear(&self, conversation: &ConversationId) {
        let cutoff = self.inner.clear_cutoff(conversation);
        let job = ClearJob::Clear {
            conversation: conversation.clone(),
            cutoff,
        };
        match self.inner.queue.try_push(job) {
            Ok(()) => tracing::trace!(conversation = %conversation, ?cutoff, "Clear queued"),
            Err(_) => self.inner.settle(conversation, cutoff),
        }
    }

    /// Synchronous form of [`Aggregator::clear`].
    pub fn clear_blocking(&self, conversation: &ConversationId) {
        let cutoff = self.inner.clear_cutoff(conversation);
        self.inner.settle(conversation, cutoff);
    }

    /// Mark messages up to `position` as seen.
    ///
    /// Entries at or below the new watermark are dropped; the summary is
    /// re-rendered from what remains, or cancelled if nothing does.
    pub fn mark_seen(&self, conversation: &ConversationId, position: Position) {
        self.inner.settle(conversation, Some(position));
    }

    /// Wait until every clear queued so far has been applied.
    pub async fn flush(&self) {
        let Some(tx) = self.inner.queue.sender() else {
            return;
        };
        let (done, finished) = oneshot::channel();
        if tx.send(ClearJob::Flush(done)).await.is_err() {
            return;
        }
        let _ = finished.await;
    }

    /// Stop accepting background clears and wait for queued ones to finish.
    /// Later clears run inline.
    pub async fn close(&self) {
        let Some(worker) = self.inner.queue.close() else {
            return;
        };
        if let Err(e) = worker.await {
            tracing::warn!("Clear worker failed: {e}");
        }
    }
}

async fn clear_worker(inner: Weak<Inner>, mut rx: mpsc::Receiver<ClearJob>) {
    while let Some(job) = rx.recv().await {
        match job {
            ClearJob::Clear {
                conversation,
                cutoff,
            } => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let task = tokio::task::spawn_blocking(move || inner.settle(&conversation, cutoff));
                if let Err(e) = task.await {
                    tracing::error!("Clear task failed: {e}");
                }
            }
            ClearJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::info!("Clear worker stopped");
}

impl Inner {
    fn enabled_for(&self, target: Option<&ConversationId>) -> bool {
        match self.store.is_disabled(target) {
            Ok(disabled) => !disabled,
            Err(e) => {
                tracing::warn!(?target, "Failed to read notification setting, assuming enabled: {e}");
                true
            }
        }
    }

    fn suppressed(&self, conversation: &ConversationId) -> bool {
        if !self.enabled_for(None) {
            tracing::trace!("Blocking notification due to global setting");
            return true;
        }
        if !self.enabled_for(Some(conversation)) {
            tracing::trace!(conversation = %conversation, "Blocking notification due to conversation setting");
            return true;
        }
        false
    }

    fn add_locked(
        &self,
        conversation: &ConversationId,
        message_id: &MessageId,
        position: Position,
        text: &str,
    ) -> AddOutcome {
        let watermark = match self.store.watermark(conversation) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(conversation = %conversation, "Failed to read watermark: {e}");
                return AddOutcome::Failed;
            }
        };
        if position <= watermark {
            tracing::trace!(
                conversation = %conversation,
                message = %message_id,
                position,
                watermark,
                "Ignoring stale message"
            );
            return AddOutcome::Stale;
        }

        let suppressed = self.suppressed(conversation);
        if suppressed && self.config.suppressed == SuppressedPolicy::Drop {
            return AddOutcome::Suppressed;
        }

        let entry = PendingEntry {
            message_id: message_id.clone(),
            position,
            text: text.to_string(),
        };
        match self.store.insert_pending(conversation, &entry) {
            Ok(true) => {}
            Ok(false) => {
                tracing::trace!(conversation = %conversation, message = %message_id, "Ignoring duplicate message");
                return AddOutcome::Duplicate;
            }
            Err(e) => {
                tracing::error!(
                    conversation = %conversation,
                    message = %message_id,
                    "Failed to persist pending message: {e}"
                );
                return AddOutcome::Failed;
            }
        }

        if suppressed {
            return AddOutcome::Suppressed;
        }
        self.refresh(conversation, watermark);
        AddOutcome::Added
    }

    /// Highest pending position, read after any in-progress add finishes.
    fn clear_cutoff(&self, conversation: &ConversationId) -> Option<Position> {
        self.locks.with(conversation, || match self.store.pending(conversation) {
            Ok(pending) => pending.iter().map(|e| e.position).max(),
            Err(e) => {
                tracing::error!(conversation = %conversation, "Failed to read pending messages: {e}");
                None
            }
        })
    }

    /// Raise the watermark to `cutoff`, drop pending entries at or below it and
    /// bring the summary in line with what remains.
    fn settle(&self, conversation: &ConversationId, cutoff: Option<Position>) {
        self.locks.with(conversation, || self.settle_locked(conversation, cutoff));
        self.locks.prune();
    }

    fn settle_locked(&self, conversation: &ConversationId, cutoff: Option<Position>) {
        let watermark = match cutoff {
            Some(cutoff) => match self.store.advance_watermark(conversation, cutoff) {
                Ok(watermark) => {
                    tracing::debug!(conversation = %conversation, watermark, "Advanced watermark");
                    watermark
                }
                Err(e) => {
                    tracing::error!(conversation = %conversation, "Failed to persist watermark: {e}");
                    self.store
                        .watermark(conversation)
                        .map_or(cutoff, |w| w.max(cutoff))
                }
            },
            None => match self.store.watermark(conversation) {
                Ok(watermark) => watermark,
                Err(e) => {
                    tracing::error!(conversation = %conversation, "Failed to read watermark: {e}");
                    UNSEEN
                }
            },
        };

        let pending = match self.store.pending(conversation) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(conversation = %conversation, "Failed to read pending messages: {e}");
                Vec::new()
            }
        };
        let remaining = self.prune_pending(conversation, watermark, &pending);

        if remaining.is_empty() {
            self.cancel(conversation);
        } else if remaining.len() != pending.len() {
            self.dispatch(conversation, &remaining);
        }
    }

    /// Entries above `watermark`. Anything at or below it is deleted.
    fn prune_pending(
        &self,
        conversation: &ConversationId,
        watermark: Position,
        pending: &[PendingEntry],
    ) -> Vec<PendingEntry> {
        let remaining: Vec<PendingEntry> = pending
            .iter()
            .filter(|e| e.position > watermark)
            .cloned()
            .collect();
        if remaining.len() == pending.len() {
            return remaining;
        }
        let written = if remaining.is_empty() {
            self.store.remove_pending(conversation)
        } else {
            self.store.replace_pending(conversation, &remaining)
        };
        if let Err(e) = written {
            tracing::error!(conversation = %conversation, "Failed to update pending messages: {e}");
        }
        remaining
    }

    /// Re-render the summary from stored entries above `watermark`.
    fn refresh(&self, conversation: &ConversationId, watermark: Position) {
        let pending = match self.store.pending(conversation) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(conversation = %conversation, "Failed to read pending messages: {e}");
                return;
            }
        };
        // Entries left behind by an interrupted clear must not resurface.
        let visible = self.prune_pending(conversation, watermark, &pending);
        self.dispatch(conversation, &visible);
    }

    fn dispatch(&self, conversation: &ConversationId, entries: &[PendingEntry]) {
        let title = self.titles.title(conversation);
        let Some(notification) = render_summary(conversation, title, entries, &self.config) else {
            return;
        };
        if let Err(e) = self.sink.upsert(&notification) {
            tracing::error!(conversation = %conversation, "Failed to show notification: {e}");
            return;
        }
        tracing::debug!(
            conversation = %conversation,
            count = entries.len(),
            more = notification.more_count,
            "Notification updated"
        );
    }

    fn cancel(&self, conversation: &ConversationId) {
        if let Err(e) = self.sink.cancel(conversation) {
            tracing::error!(conversation = %conversation, "Failed to cancel notification: {e}");
        }
    }
}

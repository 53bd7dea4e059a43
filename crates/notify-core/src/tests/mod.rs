use std::sync::{Arc, Mutex};

use crate::{
    Aggregator, AggregatorConfig, ConversationId, MemoryStore, NotificationSink, NotificationStore,
    SinkError, SummaryNotification,
};

mod aggregator;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SinkCall {
    Upsert(SummaryNotification),
    Cancel(ConversationId),
    CancelAll,
}

/// Records every dispatch; can be switched to fail.
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    failing: Mutex<bool>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn upserts(&self) -> Vec<SummaryNotification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Upsert(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn last_upsert(&self) -> Option<SummaryNotification> {
        self.upserts().pop()
    }

    fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn record(&self, call: SinkCall) -> Result<(), SinkError> {
        if *self.failing.lock().unwrap() {
            return Err(SinkError::Unavailable("test sink offline".into()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl NotificationSink for RecordingSink {
    fn upsert(&self, notification: &SummaryNotification) -> Result<(), SinkError> {
        self.record(SinkCall::Upsert(notification.clone()))
    }

    fn cancel(&self, key: &ConversationId) -> Result<(), SinkError> {
        self.record(SinkCall::Cancel(key.clone()))
    }

    fn cancel_all(&self) -> Result<(), SinkError> {
        self.record(SinkCall::CancelAll)
    }
}

struct Harness {
    aggregator: Aggregator,
    store: Arc<MemoryStore>,
    sink: Arc<RecordingSink>,
}

fn harness() -> Harness {
    harness_with(AggregatorConfig::default())
}

/// Harness whose clears go through the background worker. Needs a runtime.
fn worker_harness() -> Harness {
    let h = harness();
    h.aggregator.start_clear_worker();
    h
}

fn harness_with(config: AggregatorConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let aggregator = build(store.clone(), sink.clone(), config);
    Harness {
        aggregator,
        store,
        sink,
    }
}

fn build(
    store: Arc<dyn NotificationStore>,
    sink: Arc<RecordingSink>,
    config: AggregatorConfig,
) -> Aggregator {
    let titles = Arc::new(|c: &ConversationId| format!("Title of {c}"));
    Aggregator::new(store, sink, titles, config)
}

fn cid(id: &str) -> ConversationId {
    ConversationId::from(id)
}

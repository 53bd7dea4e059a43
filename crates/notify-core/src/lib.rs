//! Per-conversation notification roll-up.
//!
//! [`Aggregator`] decides whether an inbound message should update the
//! conversation's summary notification, tracks the highest position already
//! seen, and keeps just enough pending state to re-render the summary without
//! consulting message history. Persistence, rendering and title lookup are
//! injected collaborators.

pub mod aggregator;
pub mod error;
pub mod locks;
pub mod memory;
mod queue;
pub mod sink;
pub mod store;
pub mod summary;
pub mod title;
pub mod types;

#[cfg(test)]
mod tests;

pub use aggregator::{AddOutcome, Aggregator, AggregatorConfig, SuppressedPolicy};
pub use error::{SinkError, StoreError};
pub use memory::MemoryStore;
pub use sink::{NotificationSink, SummaryNotification};
pub use store::NotificationStore;
pub use summary::{SummaryStrings, render_summary};
pub use title::TitleResolver;
pub use types::{ConversationId, MessageId, PendingEntry, Position, UNSEEN};

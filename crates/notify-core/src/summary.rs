//! Summary rendering: turns a conversation's pending entries into one
//! [`SummaryNotification`].

use crate::aggregator::AggregatorConfig;
use crate::sink::SummaryNotification;
use crate::types::{ConversationId, PendingEntry};

const COUNT_PLACEHOLDER: &str = "{count}";

/// User-facing templates. `{count}` is replaced with a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryStrings {
    /// Collapsed text when more than one message is pending.
    pub new_messages: String,
    /// Summary line for messages beyond the line cap.
    pub more_messages: String,
}

impl Default for SummaryStrings {
    fn default() -> Self {
        Self {
            new_messages: "{count} new messages".into(),
            more_messages: "+{count} more".into(),
        }
    }
}

impl SummaryStrings {
    pub fn new_messages(&self, count: usize) -> String {
        self.new_messages.replace(COUNT_PLACEHOLDER, &count.to_string())
    }

    pub fn more_messages(&self, count: usize) -> String {
        self.more_messages.replace(COUNT_PLACEHOLDER, &count.to_string())
    }
}

/// Render the summary for `entries`, given in arrival order.
///
/// Lines are ordered by position; equal positions keep arrival order. Only
/// the newest `config.max_lines` entries are listed. Returns `None` when
/// nothing is pending.
pub fn render_summary(
    key: &ConversationId,
    title: String,
    entries: &[PendingEntry],
    config: &AggregatorConfig,
) -> Option<SummaryNotification> {
    let mut sorted: Vec<&PendingEntry> = entries.iter().collect();
    // Stable sort, so ties stay in arrival order.
    sorted.sort_by_key(|e| e.position);
    let latest = sorted.last()?;

    let count = sorted.len();
    let cap = config.max_lines.max(1);
    let more_count = count.saturating_sub(cap);

    let lines = sorted[more_count..]
        .iter()
        .map(|e| e.text.clone())
        .collect();
    let summary_text = (more_count > 0).then(|| config.strings.more_messages(more_count));
    let collapsed_text = if count == 1 {
        latest.text.clone()
    } else {
        config.strings.new_messages(count)
    };

    Some(SummaryNotification {
        key: key.clone(),
        title,
        collapsed_text,
        lines,
        more_count,
        summary_text,
        latest_message_id: latest.message_id.clone(),
    })
}

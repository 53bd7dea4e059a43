//! Notification sink that emits rendered notifications as JSON lines.

use std::io::Write;
use std::sync::Mutex;

use dashmap::DashSet;
use notify_core::{ConversationId, NotificationSink, SinkError, SummaryNotification};
use serde::Serialize;

use crate::config::OutputMode;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum SinkEvent<'a> {
    Upsert {
        at: String,
        replaced: bool,
        notification: &'a SummaryNotification,
    },
    Cancel {
        at: String,
        key: &'a ConversationId,
    },
    CancelAll {
        at: String,
    },
}

/// Writes one JSON object per dispatch, or only logs it in [`OutputMode::Log`].
///
/// Tracks which conversations currently have a visible notification so that
/// each upsert can report whether it replaced an earlier one.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
    output: OutputMode,
    visible: DashSet<ConversationId>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout(output: OutputMode) -> Self {
        Self::new(std::io::stdout(), output)
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W, output: OutputMode) -> Self {
        Self {
            writer: Mutex::new(writer),
            output,
            visible: DashSet::new(),
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|_| SinkError::Unavailable("writer lock poisoned".into()))
    }

    fn emit(&self, event: &SinkEvent<'_>) -> Result<(), SinkError> {
        let line = serde_json::to_string(event).map_err(|e| SinkError::Encode(e.to_string()))?;
        match self.output {
            OutputMode::Log => {
                tracing::info!(notification = %line, "Notification event");
            }
            OutputMode::Stdout => {
                let mut writer = self
                    .writer
                    .lock()
                    .map_err(|_| SinkError::Unavailable("writer lock poisoned".into()))?;
                writeln!(writer, "{line}")?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn upsert(&self, notification: &SummaryNotification) -> Result<(), SinkError> {
        let replaced = !self.visible.insert(notification.key.clone());
        self.emit(&SinkEvent::Upsert {
            at: now(),
            replaced,
            notification,
        })
    }

    fn cancel(&self, key: &ConversationId) -> Result<(), SinkError> {
        self.visible.remove(key);
        self.emit(&SinkEvent::Cancel { at: now(), key })
    }

    fn cancel_all(&self) -> Result<(), SinkError> {
        self.visible.clear();
        self.emit(&SinkEvent::CancelAll { at: now() })
    }
}

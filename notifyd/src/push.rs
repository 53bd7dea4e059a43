//! Push intake: parses intent-like JSON envelopes and drives the aggregator.
//!
//! Each input line looks like
//! `{"action": "com.layer.sdk.PUSH", "extras": {"layer-conversation-id": ..., ...}}`.

use std::sync::Arc;

use notify_core::{AddOutcome, Aggregator, ConversationId, MessageId, Position};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::titles::TitleCache;

pub const ACTION_PUSH: &str = "com.layer.sdk.PUSH";
pub const ACTION_OPEN_CONVERSATION: &str = "OPEN_CONVERSATION";
pub const ACTION_MARK_READ: &str = "MARK_READ";
pub const ACTION_SET_ENABLED: &str = "SET_ENABLED";

pub const LAYER_TEXT_KEY: &str = "layer-push-message";
pub const LAYER_CONVERSATION_KEY: &str = "layer-conversation-id";
pub const LAYER_MESSAGE_KEY: &str = "layer-message-id";
pub const LAYER_POSITION_KEY: &str = "layer-message-position";
pub const LAYER_TITLE_KEY: &str = "layer-conversation-title";
pub const ENABLED_KEY: &str = "enabled";

#[derive(Debug, Deserialize)]
struct Intent {
    action: String,
    #[serde(default)]
    extras: Option<Map<String, Value>>,
}

/// A parsed intake command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A new message. `position` is `None` when its content could not be fetched.
    Push {
        conversation: ConversationId,
        message: MessageId,
        position: Option<Position>,
        text: String,
        title: Option<String>,
    },
    /// The user swiped the notification away.
    Cancel { conversation: Option<ConversationId> },
    /// The conversation was opened.
    Open { conversation: ConversationId },
    /// Messages up to `position` were read.
    MarkRead {
        conversation: ConversationId,
        position: Position,
    },
    /// Toggle notifications globally (`conversation: None`) or for one conversation.
    SetEnabled {
        conversation: Option<ConversationId>,
        enabled: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("malformed intent: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No message to notify: {0}")]
    MissingMessage(String),

    #[error("No conversation to notify: {0}")]
    MissingConversation(String),

    #[error("Missing or invalid extra '{key}': {extras}")]
    InvalidExtra { key: &'static str, extras: String },

    #[error("Got unknown intent action: {0}")]
    UnknownAction(String),
}

/// Parse one input line. `Ok(None)` means the intent carried no extras and is
/// ignored.
pub fn parse_intent(line: &str, cancel_action: &str) -> Result<Option<Command>, PushError> {
    let intent: Intent = serde_json::from_str(line)?;
    let Some(extras) = intent.extras else {
        return Ok(None);
    };

    let command = match intent.action.as_str() {
        ACTION_PUSH => {
            let message = string_extra(&extras, LAYER_MESSAGE_KEY)
                .ok_or_else(|| PushError::MissingMessage(Value::Object(extras.clone()).to_string()))?;
            let conversation = string_extra(&extras, LAYER_CONVERSATION_KEY).ok_or_else(|| {
                PushError::MissingConversation(Value::Object(extras.clone()).to_string())
            })?;
            Command::Push {
                conversation: ConversationId::from(conversation),
                message: MessageId::from(message),
                position: int_extra(&extras, LAYER_POSITION_KEY),
                text: string_extra(&extras, LAYER_TEXT_KEY).unwrap_or_default(),
                title: string_extra(&extras, LAYER_TITLE_KEY),
            }
        }
        action if action == cancel_action => Command::Cancel {
            conversation: string_extra(&extras, LAYER_CONVERSATION_KEY).map(ConversationId::from),
        },
        ACTION_OPEN_CONVERSATION => Command::Open {
            conversation: required_conversation(&extras)?,
        },
        ACTION_MARK_READ => Command::MarkRead {
            conversation: required_conversation(&extras)?,
            position: int_extra(&extras, LAYER_POSITION_KEY)
                .ok_or_else(|| invalid_extra(LAYER_POSITION_KEY, &extras))?,
        },
        ACTION_SET_ENABLED => Command::SetEnabled {
            conversation: string_extra(&extras, LAYER_CONVERSATION_KEY).map(ConversationId::from),
            enabled: extras
                .get(ENABLED_KEY)
                .and_then(Value::as_bool)
                .ok_or_else(|| invalid_extra(ENABLED_KEY, &extras))?,
        },
        other => return Err(PushError::UnknownAction(other.to_string())),
    };
    Ok(Some(command))
}

fn string_extra(extras: &Map<String, Value>, key: &str) -> Option<String> {
    extras
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Integer extras may arrive as JSON numbers or numeric strings.
fn int_extra(extras: &Map<String, Value>, key: &str) -> Option<i64> {
    match extras.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_conversation(extras: &Map<String, Value>) -> Result<ConversationId, PushError> {
    string_extra(extras, LAYER_CONVERSATION_KEY)
        .map(ConversationId::from)
        .ok_or_else(|| PushError::MissingConversation(Value::Object(extras.clone()).to_string()))
}

fn invalid_extra(key: &'static str, extras: &Map<String, Value>) -> PushError {
    PushError::InvalidExtra {
        key,
        extras: Value::Object(extras.clone()).to_string(),
    }
}

/// Applies intake commands to an [`Aggregator`].
#[derive(Clone)]
pub struct PushReceiver {
    aggregator: Aggregator,
    titles: Arc<TitleCache>,
    cancel_action: String,
}

impl PushReceiver {
    pub fn new(aggregator: Aggregator, titles: Arc<TitleCache>, cancel_action: String) -> Self {
        Self {
            aggregator,
            titles,
            cancel_action,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Parse and apply one line. Errors are logged, never returned.
    pub fn handle_line(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match parse_intent(line, &self.cancel_action) {
            Ok(Some(command)) => self.handle(command),
            Ok(None) => tracing::debug!("Ignoring intent without extras"),
            Err(e) => tracing::error!("{e}"),
        }
    }

    pub fn handle(&self, command: Command) {
        match command {
            Command::Push {
                conversation,
                message,
                position,
                text,
                title,
            } => {
                tracing::trace!(message = %message, "Received notification");
                if let Some(title) = title {
                    self.titles.remember(&conversation, &title);
                }
                let Some(position) = position else {
                    tracing::error!(message = %message, "Failed to fetch notification content");
                    return;
                };
                match self.aggregator.add(&conversation, &message, position, &text) {
                    AddOutcome::Added => {
                        tracing::trace!(conversation = %conversation, "Posted notification")
                    }
                    AddOutcome::Suppressed => tracing::trace!(
                        conversation = %conversation,
                        "Notification blocked by app or conversation setting"
                    ),
                    outcome => {
                        tracing::trace!(conversation = %conversation, ?outcome, "Notification skipped")
                    }
                }
            }
            Command::Cancel { conversation } => {
                let Some(conversation) = conversation else {
                    tracing::error!("Cancel intent without conversation");
                    return;
                };
                tracing::trace!(conversation = %conversation, "Cancelling notifications");
                self.aggregator.clear(&conversation);
            }
            Command::Open { conversation } => {
                self.aggregator.clear(&conversation);
            }
            Command::MarkRead {
                conversation,
                position,
            } => {
                self.aggregator.mark_seen(&conversation, position);
            }
            Command::SetEnabled {
                conversation,
                enabled,
            } => match conversation {
                Some(c) => self.aggregator.set_conversation_enabled(&c, enabled),
                None => self.aggregator.set_enabled(enabled),
            },
        }
    }
}

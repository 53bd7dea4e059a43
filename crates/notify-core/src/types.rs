//! Identifiers and pending entry types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-conversation message ordering key.
pub type Position = i64;

/// Watermark of a conversation with no recorded state.
pub const UNSEEN: Position = Position::MIN;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Opaque conversation identifier, usually a `layer:///conversations/...` URI.
    ConversationId
);

string_id!(
    /// Opaque message identifier, unique within a conversation.
    MessageId
);

/// An unread message waiting to be shown in its conversation's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub message_id: MessageId,
    pub position: Position,
    pub text: String,
}

impl PendingEntry {
    pub fn new(message_id: impl Into<MessageId>, position: Position, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            position,
            text: text.into(),
        }
    }
}

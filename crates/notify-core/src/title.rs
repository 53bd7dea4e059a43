//! Conversation title lookup.

use crate::types::ConversationId;

/// Resolves the display title of a conversation. May do its own I/O or caching.
pub trait TitleResolver: Send + Sync {
    fn title(&self, conversation: &ConversationId) -> String;
}

impl<F> TitleResolver for F
where
    F: Fn(&ConversationId) -> String + Send + Sync,
{
    fn title(&self, conversation: &ConversationId) -> String {
        self(conversation)
    }
}

//! Conversation titles learned from push payloads.

use dashmap::DashMap;
use notify_core::{ConversationId, TitleResolver};

/// Remembers the latest title announced for each conversation and falls back
/// to the conversation ID when none was seen.
#[derive(Debug, Default)]
pub struct TitleCache {
    titles: DashMap<ConversationId, String>,
}

impl TitleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&self, conversation: &ConversationId, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        self.titles.insert(conversation.clone(), title.to_string());
    }
}

impl TitleResolver for TitleCache {
    fn title(&self, conversation: &ConversationId) -> String {
        self.titles
            .get(conversation)
            .map(|t| t.clone())
            .unwrap_or_else(|| conversation.to_string())
    }
}

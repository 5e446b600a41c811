use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::TypingIndicator;

/// In-process registry of typing signals, keyed by (chat, user). Entries
/// expire by TTL; expired ones are evicted lazily on read.
#[derive(Debug, Default)]
pub struct TypingRegistry {
    indicators: DashMap<(Uuid, Uuid), TypingIndicator>,
}

impl TypingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes or refreshes the indicator with `created_at = now`.
    pub fn publish(&self, chat_id: Uuid, user_id: Uuid, user_name: String) {
        self.indicators
            .insert((chat_id, user_id), TypingIndicator::new(user_id, user_name));
    }

    pub fn active_for_chat(&self, chat_id: Uuid, now: OffsetDateTime) -> Vec<TypingIndicator> {
        self.indicators
            .retain(|_, indicator| indicator.is_active(now));
        let mut active: Vec<TypingIndicator> = self
            .indicators
            .iter()
            .filter(|entry| entry.key().0 == chat_id)
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        active
    }
}

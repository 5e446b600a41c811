use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{ActorRole, ChatMessage, ChatSummary, PersistedMessage};
use crate::db::DatabaseError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(&self, summary: &ChatSummary) -> Result<(), DatabaseError>;

    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<ChatSummary>, DatabaseError>;

    /// Appends the message and bumps `unread_counts[recipient_id]` in the
    /// same transaction, with an atomic server-side increment.
    async fn append_message(
        &self,
        chat_id: Uuid,
        message: &PersistedMessage,
        recipient_id: Uuid,
    ) -> Result<ChatMessage, DatabaseError>;

    /// Flips the reader's read flag on every message in the chat and resets
    /// their unread counter to zero.
    async fn mark_read(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        reader_role: ActorRole,
    ) -> Result<(), DatabaseError>;

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<ChatMessage>, DatabaseError>;
}

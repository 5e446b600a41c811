use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::db::models::{
    ActorRole, ChatMessage, ChatSummary, NewChat, NewChatMessage, PersistedMessage,
};
use crate::db::DatabaseError;

use super::store::ChatStore;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat {0} not found")]
    ChatNotFound(Uuid),

    #[error("user {0} is not a participant of this chat")]
    NotParticipant(Uuid),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server error: {0}")]
    Server(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,
}

impl ChatError {
    /// Transient failures the caller may retry; everything else is a
    /// permanent rejection. Retryability is a property of the error kind,
    /// not a universal rule.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_)
                | ChatError::Timeout
                | ChatError::Server(_)
                | ChatError::RateLimitExceeded
        )
    }
}

impl From<DatabaseError> for ChatError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => ChatError::Timeout,
            DatabaseError::Sqlx(sqlx::Error::Io(io)) => ChatError::Network(io.to_string()),
            other => ChatError::Server(other.to_string()),
        }
    }
}

pub async fn create_chat(
    store: &dyn ChatStore,
    new: NewChat,
) -> Result<ChatSummary, ChatError> {
    if new.client.id == new.dietitian.id {
        return Err(ChatError::InvalidRequest(
            "a chat needs two distinct participants".to_string(),
        ));
    }

    let summary = ChatSummary::new(new.client, new.dietitian);
    store.create_chat(&summary).await?;
    info!(chat_id = %summary.id, "chat created");
    Ok(summary)
}

pub async fn get_chat(store: &dyn ChatStore, chat_id: Uuid) -> Result<ChatSummary, ChatError> {
    store
        .get_chat(chat_id)
        .await?
        .ok_or(ChatError::ChatNotFound(chat_id))
}

/// Validates the draft against the chat's participant set, projects it onto
/// the persisted allow-list and hands it to the store, which bumps the
/// recipient's unread counter in the same write.
pub async fn send(
    store: &dyn ChatStore,
    chat_id: Uuid,
    new: NewChatMessage,
) -> Result<ChatMessage, ChatError> {
    let summary = get_chat(store, chat_id).await?;
    let sender_role = summary
        .participant_role(new.sender_id)
        .ok_or(ChatError::NotParticipant(new.sender_id))?;
    let recipient_id = summary
        .recipient_of(new.sender_id)
        .ok_or(ChatError::NotParticipant(new.sender_id))?;

    let message = project_message(new, sender_role)?;
    let stored = store.append_message(chat_id, &message, recipient_id).await?;
    info!(
        chat_id = %chat_id,
        message_id = %stored.id,
        has_attachment = stored.message.has_attachment(),
        "message sent"
    );
    Ok(stored)
}

/// Field-by-field projection of a draft onto the persisted field set. The
/// sender's own read flag starts true, the counterpart's false.
pub fn project_message(
    new: NewChatMessage,
    sender_role: ActorRole,
) -> Result<PersistedMessage, ChatError> {
    let has_attachment =
        new.image_url.is_some() || new.video_url.is_some() || new.file_url.is_some();
    if new.text.trim().is_empty() && !has_attachment {
        return Err(ChatError::InvalidRequest(
            "message has neither text nor attachment".to_string(),
        ));
    }

    Ok(PersistedMessage {
        text: new.text,
        sender_id: new.sender_id,
        sender_name: new.sender_name,
        sender_avatar_url: new.sender_avatar_url,
        sent_at: OffsetDateTime::now_utc(),
        is_read_by_client: sender_role == ActorRole::Client,
        is_read_by_dietitian: sender_role == ActorRole::Dietitian,
        image_url: new.image_url,
        video_url: new.video_url,
        file_url: new.file_url,
    })
}

pub async fn mark_read(
    store: &dyn ChatStore,
    chat_id: Uuid,
    reader_id: Uuid,
) -> Result<(), ChatError> {
    let summary = get_chat(store, chat_id).await?;
    let reader_role = summary
        .participant_role(reader_id)
        .ok_or(ChatError::NotParticipant(reader_id))?;

    store.mark_read(chat_id, reader_id, reader_role).await?;
    info!(chat_id = %chat_id, reader_id = %reader_id, "chat marked read");
    Ok(())
}

pub async fn history(
    store: &dyn ChatStore,
    chat_id: Uuid,
) -> Result<Vec<ChatMessage>, ChatError> {
    // Existence check keeps "unknown chat" distinct from "empty chat".
    get_chat(store, chat_id).await?;
    Ok(store.list_messages(chat_id).await?)
}

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{
    ActorRole, ChatMessage, ChatSummary, ParticipantInfo, PersistedMessage,
};
use crate::db::DatabaseError;
use crate::modules::chat::store::ChatStore;

const MESSAGE_COLUMNS: &str = "id, chat_id, text, sender_id, sender_name, sender_avatar_url, \
                               sent_at, is_read_by_client, is_read_by_dietitian, \
                               image_url, video_url, file_url";

pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    id: Uuid,
    client_id: Uuid,
    client_name: String,
    client_avatar_url: Option<String>,
    dietitian_id: Uuid,
    dietitian_name: String,
    dietitian_avatar_url: Option<String>,
    unread_counts: Json<HashMap<Uuid, i64>>,
    updated_at: OffsetDateTime,
}

impl From<ChatRow> for ChatSummary {
    fn from(row: ChatRow) -> Self {
        ChatSummary {
            id: row.id,
            client: ParticipantInfo {
                id: row.client_id,
                name: row.client_name,
                avatar_url: row.client_avatar_url,
            },
            dietitian: ParticipantInfo {
                id: row.dietitian_id,
                name: row.dietitian_name,
                avatar_url: row.dietitian_avatar_url,
            },
            unread_counts: row.unread_counts.0,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    chat_id: Uuid,
    text: String,
    sender_id: Uuid,
    sender_name: String,
    sender_avatar_url: Option<String>,
    sent_at: OffsetDateTime,
    is_read_by_client: bool,
    is_read_by_dietitian: bool,
    image_url: Option<String>,
    video_url: Option<String>,
    file_url: Option<String>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: row.id,
            chat_id: row.chat_id,
            message: PersistedMessage {
                text: row.text,
                sender_id: row.sender_id,
                sender_name: row.sender_name,
                sender_avatar_url: row.sender_avatar_url,
                sent_at: row.sent_at,
                is_read_by_client: row.is_read_by_client,
                is_read_by_dietitian: row.is_read_by_dietitian,
                image_url: row.image_url,
                video_url: row.video_url,
                file_url: row.file_url,
            },
        }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create_chat(&self, summary: &ChatSummary) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO chats \
             (id, client_id, client_name, client_avatar_url, \
              dietitian_id, dietitian_name, dietitian_avatar_url, \
              unread_counts, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(summary.id)
        .bind(summary.client.id)
        .bind(&summary.client.name)
        .bind(&summary.client.avatar_url)
        .bind(summary.dietitian.id)
        .bind(&summary.dietitian.name)
        .bind(&summary.dietitian.avatar_url)
        .bind(Json(&summary.unread_counts))
        .bind(summary.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<ChatSummary>, DatabaseError> {
        let row = sqlx::query_as::<_, ChatRow>(
            "SELECT id, client_id, client_name, client_avatar_url, \
                    dietitian_id, dietitian_name, dietitian_avatar_url, \
                    unread_counts, updated_at \
             FROM chats WHERE id = $1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ChatSummary::from))
    }

    async fn append_message(
        &self,
        chat_id: Uuid,
        message: &PersistedMessage,
        recipient_id: Uuid,
    ) -> Result<ChatMessage, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Every column written here comes from PersistedMessage; there is no
        // generic map forwarded from the request.
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "INSERT INTO chat_messages \
             (id, chat_id, text, sender_id, sender_name, sender_avatar_url, \
              sent_at, is_read_by_client, is_read_by_dietitian, \
              image_url, video_url, file_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(&message.text)
        .bind(message.sender_id)
        .bind(&message.sender_name)
        .bind(&message.sender_avatar_url)
        .bind(message.sent_at)
        .bind(message.is_read_by_client)
        .bind(message.is_read_by_dietitian)
        .bind(&message.image_url)
        .bind(&message.video_url)
        .bind(&message.file_url)
        .fetch_one(&mut *tx)
        .await?;

        // Server-side increment; concurrent sends never lose a count to a
        // read-modify-write race.
        sqlx::query(
            "UPDATE chats SET \
                 unread_counts = jsonb_set( \
                     unread_counts, \
                     ARRAY[$2::text], \
                     (COALESCE(unread_counts ->> $2::text, '0')::bigint + 1)::text::jsonb \
                 ), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(chat_id)
        .bind(recipient_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ChatMessage::from(row))
    }

    async fn mark_read(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        reader_role: ActorRole,
    ) -> Result<(), DatabaseError> {
        let flag_update = match reader_role {
            ActorRole::Client => {
                "UPDATE chat_messages SET is_read_by_client = TRUE WHERE chat_id = $1"
            }
            ActorRole::Dietitian => {
                "UPDATE chat_messages SET is_read_by_dietitian = TRUE WHERE chat_id = $1"
            }
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(flag_update)
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE chats SET \
                 unread_counts = jsonb_set(unread_counts, ARRAY[$2::text], '0'::jsonb), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(chat_id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<ChatMessage>, DatabaseError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE chat_id = $1 ORDER BY sent_at"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }
}

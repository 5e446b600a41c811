use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::appointment::ActorRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// One document per two-party conversation. `unread_counts` is keyed by
/// both participant ids and starts at 0 for each.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: Uuid,
    pub client: ParticipantInfo,
    pub dietitian: ParticipantInfo,
    pub unread_counts: HashMap<Uuid, i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ChatSummary {
    pub fn new(client: ParticipantInfo, dietitian: ParticipantInfo) -> Self {
        let unread_counts = HashMap::from([(client.id, 0), (dietitian.id, 0)]);
        Self {
            id: Uuid::new_v4(),
            client,
            dietitian,
            unread_counts,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn participant_role(&self, user_id: Uuid) -> Option<ActorRole> {
        if user_id == self.client.id {
            Some(ActorRole::Client)
        } else if user_id == self.dietitian.id {
            Some(ActorRole::Dietitian)
        } else {
            None
        }
    }

    /// The other participant, i.e. whoever a message from `sender_id` is for.
    pub fn recipient_of(&self, sender_id: Uuid) -> Option<Uuid> {
        match self.participant_role(sender_id)? {
            ActorRole::Client => Some(self.dietitian.id),
            ActorRole::Dietitian => Some(self.client.id),
        }
    }

    pub fn unread_for(&self, user_id: Uuid) -> i64 {
        self.unread_counts.get(&user_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    Image,
    Video,
    File,
}

/// Exactly the field set a message may be persisted with. Built field by
/// field from a validated draft; request payloads are never forwarded as a
/// raw map, so nothing outside this struct can reach storage.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedMessage {
    pub text: String,
    pub sender_id: Uuid,
    pub sender_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
    pub is_read_by_client: bool,
    pub is_read_by_dietitian: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl PersistedMessage {
    /// At most one attachment type; image takes precedence over video,
    /// video over file.
    pub fn attachment_type(&self) -> Option<AttachmentType> {
        if self.image_url.is_some() {
            Some(AttachmentType::Image)
        } else if self.video_url.is_some() {
            Some(AttachmentType::Video)
        } else if self.file_url.is_some() {
            Some(AttachmentType::File)
        } else {
            None
        }
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment_type().is_some()
    }

    pub fn display_text(&self) -> String {
        if !self.text.is_empty() {
            return self.text.clone();
        }
        match self.attachment_type() {
            Some(AttachmentType::Image) => "📷 Photo".to_string(),
            Some(AttachmentType::Video) => "🎥 Video".to_string(),
            Some(AttachmentType::File) => "📎 File".to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    #[serde(flatten)]
    pub message: PersistedMessage,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewChatMessage {
    #[serde(default)]
    pub text: String,
    pub sender_id: Uuid,
    #[validate(length(min = 1, message = "Sender name must not be empty"))]
    pub sender_name: String,
    #[validate(url)]
    pub sender_avatar_url: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(url)]
    pub file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewChat {
    pub client: ParticipantInfo,
    pub dietitian: ParticipantInfo,
}

#[derive(Debug, Deserialize)]
pub struct MarkRead {
    pub reader_id: Uuid,
}

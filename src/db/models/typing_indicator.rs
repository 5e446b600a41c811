use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// How long a typing signal stays live after it was written.
pub const TYPING_TTL: Duration = Duration::seconds(5);

/// Ephemeral presence signal. Expires purely by time passing; no explicit
/// deletion is required.
#[derive(Debug, Clone, Serialize)]
pub struct TypingIndicator {
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TypingIndicator {
    pub fn new(user_id: Uuid, user_name: String) -> Self {
        Self {
            user_id,
            user_name,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        now - self.created_at < TYPING_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_immediately_after_creation() {
        let indicator = TypingIndicator::new(Uuid::new_v4(), "Alex".to_string());
        assert!(indicator.is_active(indicator.created_at));
        assert!(indicator.is_active(indicator.created_at + Duration::seconds(4)));
    }

    #[test]
    fn inactive_once_ttl_has_elapsed() {
        let indicator = TypingIndicator::new(Uuid::new_v4(), "Alex".to_string());
        assert!(!indicator.is_active(indicator.created_at + TYPING_TTL));
        assert!(!indicator.is_active(indicator.created_at + Duration::seconds(30)));
    }

    #[test]
    fn active_just_under_the_ttl() {
        let indicator = TypingIndicator::new(Uuid::new_v4(), "Alex".to_string());
        let just_under = indicator.created_at + TYPING_TTL - Duration::milliseconds(1);
        assert!(indicator.is_active(just_under));
    }
}

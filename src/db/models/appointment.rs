use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::time_range::{InvalidTimeRange, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

/// UI hint attached to each status; the backend never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSeverity {
    Info,
    Success,
    Warning,
    Danger,
    Muted,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No Show",
        }
    }

    #[allow(unused)]
    pub fn severity(&self) -> StatusSeverity {
        match self {
            AppointmentStatus::Pending => StatusSeverity::Warning,
            AppointmentStatus::Confirmed => StatusSeverity::Info,
            AppointmentStatus::Scheduled => StatusSeverity::Info,
            AppointmentStatus::Completed => StatusSeverity::Success,
            AppointmentStatus::Cancelled => StatusSeverity::Muted,
            AppointmentStatus::NoShow => StatusSeverity::Danger,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShow
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Client,
    Dietitian,
}

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub dietitian_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    #[serde(flatten)]
    pub time_range: TimeRange,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Appointment {
    pub fn new(
        dietitian_id: Uuid,
        client_id: Uuid,
        client_name: String,
        time_range: TimeRange,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            dietitian_id,
            client_id,
            client_name,
            time_range,
            status,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(unused)]
    pub fn duration_string(&self) -> String {
        self.time_range.duration_string()
    }

    #[allow(unused)]
    pub fn time_range_string(&self) -> String {
        self.time_range.time_range_string()
    }

    #[allow(unused)]
    pub fn short_time_string(&self) -> String {
        self.time_range.short_time_string()
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewAppointment {
    pub dietitian_id: Uuid,
    pub client_id: Uuid,
    #[validate(length(min = 1, message = "Client name must not be empty"))]
    pub client_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub notes: Option<String>,
    /// A dietitian booking a slot themselves skips the pending step.
    #[serde(default)]
    pub direct_booking: bool,
}

impl NewAppointment {
    pub fn time_range(&self) -> Result<TimeRange, InvalidTimeRange> {
        TimeRange::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    pub actor_role: ActorRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn status_has_six_variants_with_distinct_display_names() {
        let names: HashSet<&str> = AppointmentStatus::ALL
            .iter()
            .map(|s| s.display_name())
            .collect();
        assert_eq!(AppointmentStatus::ALL.len(), 6);
        assert_eq!(names.len(), 6);
        assert_eq!(AppointmentStatus::Cancelled.display_name(), "Cancelled");
    }

    #[test]
    fn terminal_states() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
        assert!(!AppointmentStatus::Scheduled.is_terminal());
    }

    #[test]
    fn every_status_carries_a_severity() {
        for status in AppointmentStatus::ALL {
            let _ = status.severity();
        }
    }
}

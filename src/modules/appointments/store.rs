use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{Appointment, AppointmentStatus};
use crate::db::DatabaseError;

/// Outcome of a guarded insert. The store re-checks the slot inside its own
/// transaction, so a proposal that passed the in-memory conflict check can
/// still lose the slot to a concurrent writer.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created,
    SlotTaken(Vec<Appointment>),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// All appointments for a dietitian, cancelled ones included.
    async fn list_for_dietitian(
        &self,
        dietitian_id: Uuid,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    /// Non-cancelled appointments for a dietitian; the set conflict checks
    /// run against.
    async fn list_active_for_dietitian(
        &self,
        dietitian_id: Uuid,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    async fn insert_if_free(
        &self,
        appointment: &Appointment,
    ) -> Result<InsertOutcome, DatabaseError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, DatabaseError>;
}

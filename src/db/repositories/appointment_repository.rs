use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{Appointment, AppointmentStatus, TimeRange};
use crate::db::DatabaseError;
use crate::modules::appointments::store::{AppointmentStore, InsertOutcome};

const SELECT_COLUMNS: &str = "id, dietitian_id, client_id, client_name, start_time, end_time, \
                              status, notes, created_at, updated_at";

pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    dietitian_id: Uuid,
    client_id: Uuid,
    client_name: String,
    start_time: OffsetDateTime,
    end_time: OffsetDateTime,
    status: AppointmentStatus,
    notes: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DatabaseError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        // The table carries the same CHECK, so this only trips on corrupt data.
        let time_range = TimeRange::new(row.start_time, row.end_time)
            .map_err(|err| DatabaseError::InvalidInput(err.to_string()))?;
        Ok(Appointment {
            id: row.id,
            dietitian_id: row.dietitian_id,
            client_id: row.client_id,
            client_name: row.client_name,
            time_range,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn rows_to_appointments(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>, DatabaseError> {
    rows.into_iter().map(Appointment::try_from).collect()
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn list_for_dietitian(
        &self,
        dietitian_id: Uuid,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM appointments \
             WHERE dietitian_id = $1 ORDER BY start_time"
        ))
        .bind(dietitian_id)
        .fetch_all(&self.pool)
        .await?;
        rows_to_appointments(rows)
    }

    async fn list_active_for_dietitian(
        &self,
        dietitian_id: Uuid,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM appointments \
             WHERE dietitian_id = $1 AND status <> 'cancelled' ORDER BY start_time"
        ))
        .bind(dietitian_id)
        .fetch_all(&self.pool)
        .await?;
        rows_to_appointments(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Appointment::try_from).transpose()
    }

    async fn insert_if_free(
        &self,
        appointment: &Appointment,
    ) -> Result<InsertOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Proposals for the same dietitian are serialized for the span of
        // this transaction, so check-then-insert cannot interleave.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(appointment.dietitian_id)
            .execute(&mut *tx)
            .await?;

        let conflicts = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM appointments \
             WHERE dietitian_id = $1 AND status <> 'cancelled' \
               AND start_time < $3 AND end_time > $2 \
             ORDER BY start_time"
        ))
        .bind(appointment.dietitian_id)
        .bind(appointment.time_range.start())
        .bind(appointment.time_range.end())
        .fetch_all(&mut *tx)
        .await?;

        if !conflicts.is_empty() {
            return Ok(InsertOutcome::SlotTaken(rows_to_appointments(conflicts)?));
        }

        sqlx::query(
            "INSERT INTO appointments \
             (id, dietitian_id, client_id, client_name, start_time, end_time, \
              status, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(appointment.id)
        .bind(appointment.dietitian_id)
        .bind(appointment.client_id)
        .bind(&appointment.client_name)
        .bind(appointment.time_range.start())
        .bind(appointment.time_range.end())
        .bind(appointment.status)
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(InsertOutcome::Created)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, DatabaseError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointments SET status = $2, updated_at = now() \
             WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;
        Appointment::try_from(row)
    }
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{Appointment, NewAppointment, StatusChange};
use crate::error::AppError;

use super::service;

pub async fn propose_appointment(
    State(state): State<AppState>,
    Json(payload): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    payload
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let appointment = service::propose(state.appointments.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChange>,
) -> Result<Json<Appointment>, AppError> {
    let updated = service::transition(
        state.appointments.as_ref(),
        id,
        payload.status,
        payload.actor_role,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub dietitian_id: Uuid,
    #[serde(default)]
    pub include_cancelled: bool,
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = service::list_for_dietitian(
        state.appointments.as_ref(),
        query.dietitian_id,
        query.include_cancelled,
    )
    .await?;
    Ok(Json(appointments))
}

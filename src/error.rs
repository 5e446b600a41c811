use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::modules::appointments::service::AppointmentError;
use crate::modules::chat::service::ChatError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, retryable) = match &self {
            AppError::Appointment(err) => match err {
                AppointmentError::InvalidTimeRange(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "Invalid time range", false)
                }
                AppointmentError::TimeSlotUnavailable(_) => {
                    (StatusCode::CONFLICT, "Time slot unavailable", false)
                }
                AppointmentError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "Appointment not found", false)
                }
                AppointmentError::Unauthorized { .. } => {
                    (StatusCode::FORBIDDEN, "Access denied", false)
                }
                AppointmentError::InvalidTransition { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Invalid status transition",
                    false,
                ),
                AppointmentError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred",
                    true,
                ),
            },
            AppError::Chat(err) => {
                let status = match err {
                    ChatError::ChatNotFound(_) => StatusCode::NOT_FOUND,
                    ChatError::NotParticipant(_) | ChatError::Unauthorized => {
                        StatusCode::FORBIDDEN
                    }
                    ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    ChatError::Network(_) => StatusCode::BAD_GATEWAY,
                    ChatError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    ChatError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    ChatError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
                };
                (status, "Chat operation failed", err.is_retryable())
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred",
                true,
            ),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error", false),
        };

        let mut body = json!({
            "error": {
                "message": error_message,
                "details": self.to_string(),
                "retryable": retryable,
            }
        });

        // Conflicts go back to the caller so the UI can offer another slot.
        if let AppError::Appointment(AppointmentError::TimeSlotUnavailable(conflicts)) = &self {
            body["error"]["conflicts"] =
                serde_json::to_value(conflicts).unwrap_or_else(|_| json!([]));
        }

        (status, Json(body)).into_response()
    }
}

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;

use super::handlers::{change_status, list_appointments, propose_appointment};

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(propose_appointment).get(list_appointments))
        .route("/{id}/status", post(change_status))
}

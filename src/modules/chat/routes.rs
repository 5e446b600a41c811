use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;

use super::handlers::{
    active_typists, create_chat, get_chat, mark_read, message_history, publish_typing,
    send_message,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_chat))
        .route("/{id}", get(get_chat))
        .route("/{id}/messages", post(send_message).get(message_history))
        .route("/{id}/read", post(mark_read))
        .route("/{id}/typing", post(publish_typing).get(active_typists))
}

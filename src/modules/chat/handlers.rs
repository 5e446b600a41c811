use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{
    ChatMessage, ChatSummary, MarkRead, NewChat, NewChatMessage, TypingIndicator,
};
use crate::error::AppError;

use super::service;

pub async fn create_chat(
    State(state): State<AppState>,
    Json(payload): Json<NewChat>,
) -> Result<(StatusCode, Json<ChatSummary>), AppError> {
    let summary = service::create_chat(state.chats.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatSummary>, AppError> {
    let summary = service::get_chat(state.chats.as_ref(), chat_id).await?;
    Ok(Json(summary))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<NewChatMessage>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    payload
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let message = service::send(state.chats.as_ref(), chat_id, payload).await?;

    // Fan the message out to connected WebSocket listeners; delivery there
    // is best-effort.
    let event = json!({ "type": "message", "chat_id": chat_id, "payload": &message });
    let _ = state.ws_tx.send(event.to_string());

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<MarkRead>,
) -> Result<StatusCode, AppError> {
    service::mark_read(state.chats.as_ref(), chat_id, payload.reader_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn message_history(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = service::history(state.chats.as_ref(), chat_id).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TypingPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "User name must not be empty"))]
    pub user_name: String,
}

pub async fn publish_typing(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(payload): Json<TypingPayload>,
) -> Result<StatusCode, AppError> {
    payload
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    state
        .typing
        .publish(chat_id, payload.user_id, payload.user_name);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn active_typists(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<TypingIndicator>>, AppError> {
    let active = state
        .typing
        .active_for_chat(chat_id, OffsetDateTime::now_utc());
    Ok(Json(active))
}

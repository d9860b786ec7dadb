//! Chat API handlers: unread counts, membership, messages, read markers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::AppState;
use crate::AppError;

/// Maps domain errors onto HTTP statuses.
pub(super) struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            _ => {
                error!(err = %self.0, "chat request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Request body for `POST /chats/{chat_id}/members`.
#[derive(Debug, Deserialize)]
pub(super) struct JoinRequest {
    user_id: String,
}

/// Request body for `POST /chats/{chat_id}/messages`.
#[derive(Debug, Deserialize)]
pub(super) struct SendRequest {
    sender_id: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    file_url: Option<String>,
}

/// Request body for `POST /chats/{chat_id}/read`.
#[derive(Debug, Deserialize)]
pub(super) struct ReadRequest {
    user_id: String,
    /// Defaults to the time the request is handled.
    #[serde(default)]
    at: Option<DateTime<Utc>>,
}

/// `GET /users/{user_id}/unread`
pub(super) async fn unread(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let chats = state.aggregator.breakdown(&user_id).await?;
    let total: u64 = chats.iter().map(|c| c.unread).sum();
    Ok(Json(json!({ "user_id": user_id, "total": total, "chats": chats })).into_response())
}

/// `POST /chats/{chat_id}/members`
pub(super) async fn join(
    Path(chat_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<Response, ApiError> {
    let membership = state.messenger.join_chat(&chat_id, &req.user_id).await?;
    Ok((StatusCode::CREATED, Json(membership)).into_response())
}

/// `POST /chats/{chat_id}/messages`
pub(super) async fn send_message(
    Path(chat_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Response, ApiError> {
    let message = state
        .messenger
        .send_message(&chat_id, &req.sender_id, req.content, req.file_url)
        .await?;
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

/// `POST /chats/{chat_id}/read`
pub(super) async fn mark_read(
    Path(chat_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<ReadRequest>,
) -> Result<Response, ApiError> {
    let at = req.at.unwrap_or_else(Utc::now);
    let membership = state.messenger.mark_read(&chat_id, &req.user_id, at).await?;
    Ok(Json(membership).into_response())
}

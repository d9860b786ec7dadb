//! Handlers for the rollover job endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use super::auth::check_bearer;
use super::AppState;
use crate::jobs::{run_job, JobKind, JobOutcome};

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type",
    ),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
];

/// `ANY /functions/reset-daily-tasks`
pub(super) async fn reset(
    method: Method,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    handle(JobKind::Reset, &method, &headers, &state).await
}

/// `ANY /functions/duplicate-daily-tasks`
pub(super) async fn duplicate(
    method: Method,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    handle(JobKind::Duplicate, &method, &headers, &state).await
}

async fn handle(kind: JobKind, method: &Method, headers: &HeaderMap, state: &AppState) -> Response {
    if *method == Method::OPTIONS {
        return (StatusCode::OK, CORS_HEADERS).into_response();
    }

    if let Err(err) = check_bearer(state.job_token.as_deref(), headers) {
        warn!(job = ?kind, %err, "job request rejected");
        return failure(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let today = (state.today)();
    match run_job(Arc::clone(&state.db), kind, today).await {
        Ok(outcome) => {
            info!(job = ?kind, count = outcome.count(), "job request finished");
            success(&outcome)
        }
        Err(err) => {
            error!(job = ?kind, %err, "job request failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn success(outcome: &JobOutcome) -> Response {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    body.insert("message".into(), Value::String(outcome.message.clone()));
    body.insert(outcome.kind.count_key().into(), json!(outcome.count()));

    if !outcome.tasks.is_empty() {
        match serde_json::to_value(&outcome.tasks) {
            Ok(tasks) => {
                body.insert("tasks".into(), tasks);
            }
            Err(err) => {
                return failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("failed to serialize tasks: {err}"),
                );
            }
        }
    }

    (StatusCode::OK, CORS_HEADERS, Json(Value::Object(body))).into_response()
}

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        CORS_HEADERS,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}

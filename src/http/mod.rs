//! HTTP surface: rollover job endpoints, chat API, and health probe.
//!
//! Job endpoints accept any method. `OPTIONS` answers the CORS preflight
//! with an empty body; every other method runs the job.

mod auth;
mod chat;
mod jobs;

use std::sync::Arc;

use axum::routing::{any, get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::feed::LocalFeed;
use crate::messaging::Messenger;
use crate::persistence::db::Database;
use crate::unread::UnreadAggregator;
use crate::{AppError, Result};

/// Route of the reset job.
pub const RESET_PATH: &str = "/functions/reset-daily-tasks";
/// Route of the duplication job.
pub const DUPLICATE_PATH: &str = "/functions/duplicate-daily-tasks";

/// Source of "today" for the duplication job.
pub type TodayFn = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared database pool.
    pub db: Arc<Database>,
    /// Unread counts for the chat API.
    pub aggregator: UnreadAggregator,
    /// Chat writes that publish to the change feed.
    pub messenger: Messenger,
    /// Bearer token required on job routes; `None` leaves them open.
    pub job_token: Option<String>,
    /// Calendar date used as "today" by the duplication job.
    pub today: TodayFn,
}

impl AppState {
    /// Build state over `db` and `feed` with "today" taken from the UTC clock.
    #[must_use]
    pub fn new(db: Arc<Database>, feed: LocalFeed, job_token: Option<String>) -> Self {
        Self {
            aggregator: UnreadAggregator::new(Arc::clone(&db)),
            messenger: Messenger::new(Arc::clone(&db), feed),
            db,
            job_token,
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replace the "today" source.
    #[must_use]
    pub fn with_today(mut self, today: TodayFn) -> Self {
        self.today = today;
        self
    }
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(RESET_PATH, any(jobs::reset))
        .route(DUPLICATE_PATH, any(jobs::duplicate))
        .route("/users/{user_id}/unread", get(chat::unread))
        .route("/chats/{chat_id}/members", post(chat::join))
        .route("/chats/{chat_id}/messages", post(chat::send_message))
        .route("/chats/{chat_id}/read", post(chat::mark_read))
        .with_state(state)
}

/// Serve the router on `bind` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the listener cannot bind, or
/// `AppError::Io` if the server fails while running.
pub async fn serve(bind: &str, state: AppState, ct: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind HTTP on {bind}: {err}")))?;

    info!(%bind, "starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("HTTP server error: {err}")))?;

    info!("HTTP server shut down");
    Ok(())
}

//! Domain model module declarations and shared timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{AppError, Result};

pub mod chat;
pub mod profile;
pub mod task;

/// Lower bound used when a membership has never been read.
pub const EPOCH_FLOOR: &str = "1970-01-01T00:00:00.000000Z";

/// Render a timestamp in the fixed-width form stored in `SQLite`.
///
/// Every persisted timestamp goes through this function so that string
/// ordering in SQL matches chronological ordering.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC 3339 timestamp column.
///
/// # Errors
///
/// Returns `AppError::Db` naming `column` if the value is malformed.
pub fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {column}: {e}")))
}

//! Bearer-token guard for the job routes.

use axum::http::HeaderMap;

use crate::{AppError, Result};

/// Check `Authorization: Bearer <token>` against `expected`.
///
/// With no expected token every request passes.
pub(super) fn check_bearer(expected: Option<&str>, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(AppError::Unauthorized("bearer token mismatch".into())),
        None => Err(AppError::Unauthorized("missing bearer token".into())),
    }
}

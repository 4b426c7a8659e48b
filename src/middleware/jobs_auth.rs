// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job trigger authentication middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the shared job trigger secret.
pub const JOB_TOKEN_HEADER: &str = "x-job-token";

/// Require the shared trigger token for `/jobs/*` routes.
pub async fn require_job_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(JOB_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let expected = state.config.job_trigger_token.as_bytes();
    let valid = !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected));

    if !valid {
        tracing::warn!(
            path = %request.uri().path(),
            "Blocked job request with missing or invalid token"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

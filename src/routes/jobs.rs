// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job trigger routes, called by an external scheduler.
//!
//! Protected by the shared `x-job-token` header (see `middleware::jobs_auth`).

use crate::error::Result;
use crate::services::{FleetReport, ProcessReport};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/sync-all", post(sync_all))
        .route("/jobs/process-due", post(process_due))
}

/// Run the fleet sync across every linked pair.
async fn sync_all(State(state): State<Arc<AppState>>) -> Result<Json<FleetReport>> {
    let report = state.fleet.run_full_sync().await?;
    Ok(Json(report))
}

/// Dispatch every reminder due now.
async fn process_due(State(state): State<Arc<AppState>>) -> Result<Json<ProcessReport>> {
    let report = state.processor.process_due(Utc::now()).await?;
    Ok(Json(report))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::models::{ContentType, Platform, Reminder, SavedContent};
use crate::routes::auth::parse_platform;
use crate::services::{ReminderView, SyncOutcome};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/platforms", get(get_platforms))
        .route("/api/content", get(get_content))
        .route("/api/sync/{platform}", post(sync_platform))
        .route("/api/reminders", get(get_reminders).post(create_reminder))
        .route("/api/account", delete(delete_account))
}

// ─── Linked Platforms ────────────────────────────────────────

#[derive(Serialize)]
pub struct PlatformsResponse {
    pub user_id: u64,
    pub linked_platforms: Vec<Platform>,
}

async fn get_platforms(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PlatformsResponse>> {
    let linked_platforms = state.accounts.linked_platforms(user.user_id).await?;
    Ok(Json(PlatformsResponse {
        user_id: user.user_id,
        linked_platforms,
    }))
}

// ─── Saved Content ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct ContentQuery {
    #[serde(default)]
    platform: Option<String>,
}

/// Saved content as returned to clients.
#[derive(Serialize)]
pub struct ContentResponse {
    pub id: String,
    pub platform: Platform,
    pub original_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub saved_at: String,
    pub original_published_at: Option<String>,
}

impl From<SavedContent> for ContentResponse {
    fn from(c: SavedContent) -> Self {
        Self {
            id: c.id,
            platform: c.platform,
            original_id: c.original_id,
            title: c.title,
            url: c.url,
            description: c.description,
            content_type: c.content_type,
            saved_at: format_utc_rfc3339(c.saved_at),
            original_published_at: c.original_published_at.map(format_utc_rfc3339),
        }
    }
}

/// List saved content, newest first, optionally for one platform.
async fn get_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Vec<ContentResponse>>> {
    let platform = query
        .platform
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(parse_platform)
        .transpose()?;

    let items = state.content.list_content(user.user_id, platform).await?;
    Ok(Json(items.into_iter().map(ContentResponse::from).collect()))
}

// ─── Sync ────────────────────────────────────────────────────

/// Sync one of the caller's linked platforms now.
async fn sync_platform(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(platform): Path<String>,
) -> Result<Json<SyncOutcome>> {
    let platform = parse_platform(&platform)?;
    let outcome = state.sync.sync(user.user_id, platform).await?;
    Ok(Json(outcome))
}

// ─── Reminders ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    pub content_id: String,
    pub reminder_time: String,
}

async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>)> {
    let reminder = state
        .reminders
        .create_reminder(user.user_id, &req.content_id, &req.reminder_time, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn get_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ReminderView>>> {
    let views = state.reminders.list_reminder_views(user.user_id).await?;
    Ok(Json(views))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub deleted_records: usize,
}

/// Delete the caller's account and all owned data, and end the session.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    let deleted_records = state.accounts.delete_account(user.user_id).await?;

    tracing::info!(user_id = user.user_id, deleted_records, "Account deleted");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(DeleteAccountResponse { deleted_records })))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and platform-linking routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::{Platform, User};
use crate::services::{EmailForm, OAuthError};
use crate::AppState;

/// Routes that establish a session or finish a provider redirect.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/oauth/{platform}/callback", get(oauth_callback))
}

/// Routes that need an existing session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/oauth/{platform}", get(oauth_start))
}

pub(crate) fn parse_platform(raw: &str) -> Result<Platform> {
    raw.parse()
        .map_err(|e: crate::models::UnknownPlatform| AppError::BadRequest(e.to_string()))
}

// ─── Register / Login ────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: u64,
    pub email: String,
    pub token: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn start_session(jar: CookieJar, user: User, signing_key: &[u8]) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_jwt(user.user_id, signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    Ok((
        jar.add(session_cookie(token.clone())),
        Json(SessionResponse {
            user_id: user.user_id,
            email: user.email,
            token,
        }),
    ))
}

/// Register a new user and start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<EmailForm>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let user = state.accounts.register_user(&form, Utc::now()).await?;
    let (jar, body) = start_session(jar, user, &state.config.jwt_signing_key)?;
    Ok((StatusCode::CREATED, jar, body))
}

/// Log in an existing user.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<EmailForm>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let user = state.accounts.login(&form).await?;
    tracing::info!(user_id = user.user_id, "User logged in");
    start_session(jar, user, &state.config.jwt_signing_key)
}

// ─── OAuth Linking ───────────────────────────────────────────

#[derive(Serialize)]
pub struct AuthorizationResponse {
    pub platform: Platform,
    pub auth_url: String,
}

/// Start linking a platform: return the provider authorization URL.
async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(platform): Path<String>,
) -> Result<Json<AuthorizationResponse>> {
    let platform = parse_platform(&platform)?;
    let auth_url = state
        .accounts
        .start_link(user.user_id, platform, Utc::now())
        .await?;

    Ok(Json(AuthorizationResponse { platform, auth_url }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct LinkedResponse {
    pub user_id: u64,
    pub platform: Platform,
    pub linked: bool,
}

/// Provider redirect target: exchange the code and store the account.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<LinkedResponse>> {
    let platform = parse_platform(&platform)?;

    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(platform = %platform, error = %error, "OAuth error from platform");
        return Err(OAuthError::Denied(error).into());
    }

    let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
        return Err(AppError::BadRequest(
            "code and state are required".to_string(),
        ));
    };

    let user_id = state
        .accounts
        .complete_link(platform, &code, &oauth_state, Utc::now())
        .await?;

    Ok(Json(LinkedResponse {
        user_id,
        platform,
        linked: true,
    }))
}

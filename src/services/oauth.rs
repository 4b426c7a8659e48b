// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth linking helpers: signed `state` and token exchange.
//!
//! The `state` parameter carries `user_id|platform|timestamp_hex`, signed with
//! HMAC-SHA256 and base64url-encoded. The callback trusts only a state whose
//! signature verifies, whose platform matches the callback route, and which is
//! no older than [`STATE_MAX_AGE_MS`].

use crate::config::Config;
use crate::models::Platform;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long an authorization round trip may take.
pub const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

/// OAuth linking failures.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid or tampered state parameter")]
    InvalidState,

    #[error("state was issued for {expected}, not {actual}")]
    PlatformMismatch { expected: Platform, actual: Platform },

    #[error("state parameter expired")]
    StateExpired,

    #[error("authorization denied: {0}")]
    Denied(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("state signing failed: {0}")]
    Signing(String),
}

/// Provider authorization endpoint and requested scope.
struct Provider {
    authorize_url: &'static str,
    scope: &'static str,
    extra: &'static str,
}

fn provider(platform: Platform) -> Provider {
    match platform {
        Platform::Youtube => Provider {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            scope: "https://www.googleapis.com/auth/youtube.readonly",
            extra: "&access_type=offline",
        },
        Platform::Twitter => Provider {
            authorize_url: "https://twitter.com/i/oauth2/authorize",
            scope: "tweet.read users.read bookmark.read offline.access",
            extra: "",
        },
        Platform::Reddit => Provider {
            authorize_url: "https://www.reddit.com/api/v1/authorize",
            scope: "identity history",
            extra: "&duration=permanent",
        },
    }
}

fn mac(key: &[u8], payload: &str) -> Result<HmacSha256, OAuthError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| OAuthError::Signing(format!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Build a signed state for linking `platform` to `user_id`.
pub fn sign_state(
    key: &[u8],
    user_id: u64,
    platform: Platform,
    now: DateTime<Utc>,
) -> Result<String, OAuthError> {
    // Create the data payload: "user_id|platform|timestamp_hex"
    let payload = format!("{}|{}|{:x}", user_id, platform, now.timestamp_millis());
    let signature = mac(key, &payload)?.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify a state issued by [`sign_state`] and return the user it names.
pub fn verify_state(
    key: &[u8],
    state: &str,
    platform: Platform,
    now: DateTime<Utc>,
) -> Result<u64, OAuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|_| OAuthError::InvalidState)?;
    let decoded = String::from_utf8(bytes).map_err(|_| OAuthError::InvalidState)?;

    // Format is "user_id|platform|timestamp_hex|signature_hex"
    let (payload, signature_hex) = decoded.rsplit_once('|').ok_or(OAuthError::InvalidState)?;
    let signature = hex::decode(signature_hex).map_err(|_| OAuthError::InvalidState)?;

    let expected = mac(key, payload)?.finalize().into_bytes();
    if !bool::from(expected.as_slice().ct_eq(&signature)) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return Err(OAuthError::InvalidState);
    }

    let mut parts = payload.splitn(3, '|');
    let (Some(user_id), Some(state_platform), Some(timestamp_hex)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(OAuthError::InvalidState);
    };

    let user_id: u64 = user_id.parse().map_err(|_| OAuthError::InvalidState)?;
    let state_platform: Platform = state_platform
        .parse()
        .map_err(|_| OAuthError::InvalidState)?;
    let issued_ms = i64::from_str_radix(timestamp_hex, 16).map_err(|_| OAuthError::InvalidState)?;

    if state_platform != platform {
        return Err(OAuthError::PlatformMismatch {
            expected: state_platform,
            actual: platform,
        });
    }

    let age = now.timestamp_millis() - issued_ms;
    if !(0..=STATE_MAX_AGE_MS).contains(&age) {
        return Err(OAuthError::StateExpired);
    }

    Ok(user_id)
}

/// Provider URL the user visits to grant access.
pub fn authorization_url(config: &Config, platform: Platform, state: &str) -> String {
    let provider = provider(platform);
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}{}",
        provider.authorize_url,
        urlencoding::encode(config.client_id(platform)),
        urlencoding::encode(&config.redirect_uri(platform)),
        urlencoding::encode(provider.scope),
        state,
        provider.extra,
    )
}

/// Tokens granted by a platform.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Exchanges an authorization code for tokens.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, platform: Platform, code: &str) -> Result<TokenGrant, OAuthError>;
}

/// Token exchange that mints random tokens valid for one hour.
#[derive(Debug, Clone, Default)]
pub struct MockTokenExchange;

#[async_trait]
impl TokenExchange for MockTokenExchange {
    async fn exchange(&self, platform: Platform, code: &str) -> Result<TokenGrant, OAuthError> {
        if code.is_empty() {
            return Err(OAuthError::Exchange("empty authorization code".to_string()));
        }

        tracing::debug!(platform = %platform, "Mock token exchange");
        Ok(TokenGrant {
            access_token: format!("mock_access_token_{}", uuid::Uuid::new_v4()),
            refresh_token: Some(format!("mock_refresh_token_{}", uuid::Uuid::new_v4())),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }
}

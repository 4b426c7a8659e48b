// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP platform adapter.
//!
//! Issues one bearer-authenticated GET against the configured endpoint and
//! unwraps the platform's response envelope:
//! - youtube: `{"items": [...]}`
//! - twitter: `{"data": [...]}`
//! - reddit: `{"data": {"children": [{"data": {...}}]}}`
//!
//! Status handling:
//! - 401/403 -> `Unauthorized` (stale or revoked credential)
//! - 429 -> `RateLimited`
//! - other non-2xx -> `Http`
//!
//! There are no retries; the caller decides what to do with a failure.

use crate::models::Platform;
use crate::services::adapter::{FetchCause, FetchError, PlatformAdapter};
use crate::services::normalize::RawItem;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Remote adapter for one platform.
#[derive(Clone)]
pub struct RemoteAdapter {
    http: reqwest::Client,
    platform: Platform,
    endpoint: String,
}

impl RemoteAdapter {
    pub fn new(platform: Platform, endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            http,
            platform,
            endpoint: endpoint.into(),
        }
    }

    fn error(&self, cause: FetchCause) -> FetchError {
        FetchError::new(self.platform, cause)
    }

    /// Check response status and map failures to a fetch cause.
    async fn check_response(&self, response: reqwest::Response) -> Result<Value, FetchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            let cause = match status.as_u16() {
                401 | 403 => FetchCause::Unauthorized,
                429 => {
                    tracing::warn!(platform = %self.platform, "Platform rate limit hit (429)");
                    FetchCause::RateLimited
                }
                code => FetchCause::Http { status: code, body },
            };
            return Err(self.error(cause));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| self.error(FetchCause::Decode(e.to_string())))
    }
}

/// Pull the item records out of a platform response body.
///
/// A body without the expected array is treated as an empty batch.
pub fn unwrap_envelope(platform: Platform, body: Value) -> Vec<RawItem> {
    let pointer = match platform {
        Platform::Youtube => "/items",
        Platform::Twitter => "/data",
        Platform::Reddit => "/data/children",
    };

    let Some(Value::Array(records)) = body.pointer(pointer).cloned() else {
        return Vec::new();
    };

    match platform {
        Platform::Reddit => records
            .into_iter()
            .filter_map(|mut child| child.get_mut("data").map(Value::take))
            .collect(),
        Platform::Youtube | Platform::Twitter => records,
    }
}

#[async_trait]
impl PlatformAdapter for RemoteAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, access_token: &str) -> Result<Vec<RawItem>, FetchError> {
        if access_token.is_empty() {
            return Err(self.error(FetchCause::EmptyCredential));
        }

        let response = self
            .http
            .get(&self.endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.error(FetchCause::Timeout)
                } else {
                    self.error(FetchCause::Network(e.to_string()))
                }
            })?;

        let body = self.check_response(response).await?;
        let items = unwrap_envelope(self.platform, body);

        tracing::debug!(platform = %self.platform, count = items.len(), "Fetched saved items");
        Ok(items)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixture-backed platform adapters for local runs and tests.

use crate::models::Platform;
use crate::services::adapter::{FetchCause, FetchError, PlatformAdapter};
use crate::services::normalize::RawItem;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Returns a fixed two-item batch per platform after an optional delay.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    platform: Platform,
    latency: Duration,
}

impl MockAdapter {
    pub fn new(platform: Platform, latency: Duration) -> Self {
        Self { platform, latency }
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, access_token: &str) -> Result<Vec<RawItem>, FetchError> {
        if access_token.is_empty() {
            return Err(FetchError::new(self.platform, FetchCause::EmptyCredential));
        }

        tracing::debug!(platform = %self.platform, "Mock fetch");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(fixtures(self.platform))
    }
}

/// Canned saved items for a platform, in that platform's native shape.
pub fn fixtures(platform: Platform) -> Vec<RawItem> {
    match platform {
        Platform::Youtube => vec![
            json!({
                "id": "video1",
                "title": "Mock YouTube Video 1",
                "url": "http://youtube.com/watch?v=video1",
                "publishedAt": "2023-10-26T10:00:00Z"
            }),
            json!({
                "id": "video2",
                "title": "Mock YouTube Video 2",
                "url": "http://youtube.com/watch?v=video2",
                "publishedAt": "2023-10-25T15:30:00Z"
            }),
        ],
        Platform::Twitter => vec![
            json!({
                "id": "tweet1",
                "text": "Mock Tweet 1",
                "url": "http://twitter.com/user/status/tweet1",
                "created_at": "Wed Oct 25 20:00:00 +0000 2023"
            }),
            json!({
                "id": "tweet2",
                "text": "Mock Tweet 2",
                "url": "http://twitter.com/user/status/tweet2",
                "created_at": "Wed Oct 25 21:00:00 +0000 2023"
            }),
        ],
        Platform::Reddit => vec![
            json!({
                "id": "post1",
                "title": "Mock Reddit Post 1",
                "url": "http://reddit.com/r/subreddit/comments/post1",
                "created_utc": 1698345600
            }),
            json!({
                "id": "post2",
                "title": "Mock Reddit Post 2",
                "url": "http://reddit.com/r/subreddit/comments/post2",
                "created_utc": 1698349200
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetch_returns_fixtures() {
        let adapter = MockAdapter::new(Platform::Reddit, Duration::ZERO);
        let items = adapter.fetch("token").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], "post1");
    }

    #[tokio::test]
    async fn test_mock_fetch_rejects_empty_credential() {
        let adapter = MockAdapter::new(Platform::Youtube, Duration::ZERO);
        let err = adapter.fetch("").await.unwrap_err();
        assert_eq!(err.cause, FetchCause::EmptyCredential);
        assert_eq!(err.platform, Platform::Youtube);
    }
}

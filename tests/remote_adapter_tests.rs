// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote platform adapter contract tests.
//!
//! These tests verify that:
//! - Requests carry the bearer credential
//! - Each platform's response envelope is unwrapped
//! - HTTP failures map to the right fetch cause
//! - Remote batches flow through the sync pipeline unchanged

use chrono::{TimeZone, Utc};
use savedhub::db::{ContentStore, MemoryDb};
use savedhub::models::{Platform, SavedContent};
use savedhub::services::{AdapterRegistry, FetchCause, PlatformAdapter, RemoteAdapter, SyncPipeline};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{link_platform, seed_user};

fn adapter(server: &MockServer, platform: Platform, route: &str) -> RemoteAdapter {
    RemoteAdapter::new(
        platform,
        format!("{}{}", server.uri(), route),
        Duration::from_secs(2),
    )
}

#[tokio::test]
async fn test_youtube_items_envelope_with_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/saved"))
        .and(header("authorization", "Bearer yt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "youtube#playlistItemListResponse",
            "items": [
                {"id": "v1", "title": "One", "url": "http://youtube.com/watch?v=v1",
                 "publishedAt": "2024-02-01T10:00:00.000Z"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let items = adapter(&mock_server, Platform::Youtube, "/youtube/saved")
        .fetch("yt-token")
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "v1");
}

#[tokio::test]
async fn test_twitter_data_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/bookmarks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "text": "first"},
                {"id": "2", "text": "second"}
            ],
            "meta": {"result_count": 2}
        })))
        .mount(&mock_server)
        .await;

    let items = adapter(&mock_server, Platform::Twitter, "/2/bookmarks")
        .fetch("tw-token")
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (401, FetchCause::Unauthorized),
        (403, FetchCause::Unauthorized),
        (429, FetchCause::RateLimited),
    ];

    for (status, expected) in cases {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let err = adapter(&mock_server, Platform::Reddit, "/saved")
            .fetch("token")
            .await
            .unwrap_err();
        assert_eq!(err.platform, Platform::Reddit);
        assert_eq!(err.cause, expected, "status {}", status);
    }
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let err = adapter(&mock_server, Platform::Twitter, "/x")
        .fetch("token")
        .await
        .unwrap_err();
    assert_eq!(
        err.cause,
        FetchCause::Http {
            status: 503,
            body: "maintenance".to_string()
        }
    );
}

#[tokio::test]
async fn test_undecodable_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = adapter(&mock_server, Platform::Youtube, "/x")
        .fetch("token")
        .await
        .unwrap_err();
    assert!(matches!(err.cause, FetchCause::Decode(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let slow = RemoteAdapter::new(
        Platform::Youtube,
        format!("{}/x", mock_server.uri()),
        Duration::from_millis(50),
    );
    let err = slow.fetch("token").await.unwrap_err();
    assert_eq!(err.cause, FetchCause::Timeout);
}

#[tokio::test]
async fn test_remote_reddit_sync_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/me/saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t3", "data": {
                        "id": "abc123",
                        "title": "Remote post",
                        "url": "https://reddit.com/r/rust/comments/abc123",
                        "selftext": "body text",
                        "created_utc": 1698349200.0
                    }}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let db = Arc::new(MemoryDb::new());
    seed_user(db.as_ref(), 5, "remote@example.com").await;
    link_platform(db.as_ref(), 5, Platform::Reddit).await;

    let adapters = AdapterRegistry::new().with_adapter(Arc::new(adapter(
        &mock_server,
        Platform::Reddit,
        "/user/me/saved",
    )));
    let outcome = SyncPipeline::new(db.clone(), db.clone(), adapters)
        .sync(5, Platform::Reddit)
        .await
        .unwrap();
    assert_eq!(outcome.items_added, 1);

    let stored = db
        .get_content(&SavedContent::content_id(5, Platform::Reddit, "abc123"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.description.as_deref(), Some("body text"));
    assert_eq!(
        stored.original_published_at,
        Some(Utc.with_ymd_and_hms(2023, 10, 26, 19, 40, 0).unwrap())
    );
}

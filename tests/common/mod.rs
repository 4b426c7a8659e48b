// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, Utc};
use savedhub::config::Config;
use savedhub::db::{CredentialStore, FirestoreDb, MemoryDb, UserStore};
use savedhub::middleware::auth::create_jwt;
use savedhub::models::{Platform, PlatformAccount, User};
use savedhub::routes::create_router;
use savedhub::services::{
    AdapterRegistry, FetchCause, FetchError, MockTokenExchange, Notifier, PlatformAdapter,
    SendError,
};
use savedhub::services::normalize::RawItem;
use savedhub::AppState;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique ID for test isolation in a shared database.
#[allow(dead_code)]
pub fn unique_user_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
    ((nanos / 1000) & ((1 << 48) - 1)) * 16 + COUNTER.fetch_add(1, Ordering::Relaxed) % 16
}

/// One delivered notification.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every message and can be told to fail for a recipient.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMessage>>,
    pub failing_recipients: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), SendError> {
        if self.failing_recipients.lock().unwrap().contains(recipient) {
            return Err(SendError {
                recipient: recipient.to_string(),
                reason: "mailbox unavailable".to_string(),
            });
        }

        self.sent.lock().unwrap().push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Adapter that always fails with the given cause.
#[allow(dead_code)]
pub struct FailingAdapter {
    pub platform: Platform,
    pub cause: FetchCause,
}

#[async_trait]
impl PlatformAdapter for FailingAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _access_token: &str) -> Result<Vec<RawItem>, FetchError> {
        Err(FetchError::new(self.platform, self.cause.clone()))
    }
}

/// Test app over an in-memory store.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Create a test app with mock adapters for every platform.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(AdapterRegistry::mock(Duration::ZERO))
}

/// Create a test app with the given adapters.
#[allow(dead_code)]
pub fn create_test_app_with(adapters: AdapterRegistry) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = Arc::new(AppState::new(
        Config::test_default(),
        db.clone(),
        adapters,
        notifier.clone(),
        Arc::new(MockTokenExchange),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        notifier,
    }
}

/// Insert a user directly into the store.
#[allow(dead_code)]
pub async fn seed_user(db: &impl UserStore, user_id: u64, email: &str) -> User {
    let user = User {
        user_id,
        email: email.to_string(),
        registered_at: Utc::now(),
    };
    db.insert_user(&user).await.unwrap();
    user
}

/// Link a platform account directly in the store.
#[allow(dead_code)]
pub async fn link_platform(db: &impl CredentialStore, user_id: u64, platform: Platform) {
    db.upsert_account(&PlatformAccount {
        user_id,
        platform,
        access_token: format!("token_{}_{}", user_id, platform),
        refresh_token: None,
        expires_at: None,
    })
    .await
    .unwrap();
}

/// `Authorization` header value for a user session.
#[allow(dead_code)]
pub fn bearer(user_id: u64) -> String {
    let config = Config::test_default();
    format!(
        "Bearer {}",
        create_jwt(user_id, &config.jwt_signing_key).unwrap()
    )
}

/// Build a request with an optional session and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    user_id: Option<u64>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(header::AUTHORIZATION, bearer(user_id));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Parse an RFC 3339 timestamp.
#[allow(dead_code)]
pub fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

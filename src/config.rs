// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::models::Platform;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SYNC_CONCURRENCY: usize = 4;
const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 30;

/// Where persistent data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process maps; data is lost on restart
    Memory,
    /// Google Cloud Firestore
    Firestore,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "firestore" => Ok(StorageBackend::Firestore),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Storage backend selection
    pub storage_backend: StorageBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Externally visible base URL, used for OAuth redirect URIs
    pub public_url: String,
    /// Worker-pool bound for fleet sync
    pub sync_concurrency: usize,
    /// Simulated latency of the mock platform adapters
    pub adapter_latency: Duration,
    /// Request timeout for remote platform adapters
    pub adapter_timeout: Duration,
    /// OAuth client ID per platform
    pub client_ids: HashMap<Platform, String>,
    /// Remote API endpoint per platform; platforms without one use the mock adapter
    pub api_urls: HashMap<Platform, String>,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    /// Shared secret required by the `/jobs/*` trigger endpoints
    pub job_trigger_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StorageBackend::Memory,
        };

        let mut client_ids = HashMap::new();
        let mut api_urls = HashMap::new();
        for platform in Platform::ALL {
            let prefix = platform.as_str().to_ascii_uppercase();
            let client_id = env::var(format!("{}_CLIENT_ID", prefix))
                .unwrap_or_else(|_| format!("mock_{}_client_id", platform));
            client_ids.insert(platform, client_id);

            if let Ok(url) = env::var(format!("{}_API_URL", prefix)) {
                let url = url.trim().to_string();
                if !url.is_empty() {
                    api_urls.insert(platform, url);
                }
            }
        }

        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT)?,
            storage_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            sync_concurrency: parse_or("SYNC_CONCURRENCY", DEFAULT_SYNC_CONCURRENCY)?.max(1),
            adapter_latency: Duration::from_millis(parse_or("ADAPTER_LATENCY_MS", 0u64)?),
            adapter_timeout: Duration::from_secs(parse_or(
                "ADAPTER_TIMEOUT_SECS",
                DEFAULT_ADAPTER_TIMEOUT_SECS,
            )?),
            client_ids,
            api_urls,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
            job_trigger_token: env::var("JOB_TRIGGER_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JOB_TRIGGER_TOKEN"))?,
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage_backend: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            public_url: "http://localhost:8080".to_string(),
            sync_concurrency: DEFAULT_SYNC_CONCURRENCY,
            adapter_latency: Duration::ZERO,
            adapter_timeout: Duration::from_secs(5),
            client_ids: Platform::ALL
                .into_iter()
                .map(|p| (p, format!("mock_{}_client_id", p)))
                .collect(),
            api_urls: HashMap::new(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!".to_vec(),
            job_trigger_token: "test_job_token".to_string(),
        }
    }

    /// OAuth client ID for a platform.
    pub fn client_id(&self, platform: Platform) -> &str {
        self.client_ids
            .get(&platform)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Redirect URI registered with the platform for the OAuth callback.
    pub fn redirect_uri(&self, platform: Platform) -> String {
        format!("{}/auth/oauth/{}/callback", self.public_url, platform)
    }
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(var, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

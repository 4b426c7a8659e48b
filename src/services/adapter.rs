// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform adapter capability and the per-platform adapter table.

use crate::models::Platform;
use crate::services::mock_adapter::MockAdapter;
use crate::services::normalize::RawItem;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Why a platform fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchCause {
    #[error("empty access credential")]
    EmptyCredential,

    #[error("credential rejected")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Failure fetching saved items from a platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{platform} fetch failed: {cause}")]
pub struct FetchError {
    pub platform: Platform,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(platform: Platform, cause: FetchCause) -> Self {
        Self { platform, cause }
    }
}

/// Fetches a user's saved items from one platform.
///
/// Implementations return platform-native records and never retry.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch(&self, access_token: &str) -> Result<Vec<RawItem>, FetchError>;
}

/// Adapter selection keyed by platform.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock adapters for every platform.
    pub fn mock(latency: Duration) -> Self {
        Platform::ALL
            .into_iter()
            .fold(Self::new(), |registry, platform| {
                registry.with_adapter(Arc::new(MockAdapter::new(platform, latency)))
            })
    }

    /// Register an adapter, replacing any existing one for its platform.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<&Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform)
    }
}

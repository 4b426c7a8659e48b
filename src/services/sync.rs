// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync pipeline for one (user, platform) pair.
//!
//! Handles the core workflow:
//! 1. Look up the linked platform account
//! 2. Fetch raw items through the platform adapter
//! 3. Normalize into the unified content shape
//! 4. Insert unseen items as one unit (insert-only, existing items untouched)

use crate::db::{ContentStore, CredentialStore};
use crate::error::AppError;
use crate::models::{Platform, SavedContent};
use crate::services::adapter::{AdapterRegistry, FetchError};
use crate::services::normalize;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Sync failures for a single pair.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no {platform} account linked for user {user_id}")]
    NotLinked { user_id: u64, platform: Platform },

    #[error("no adapter registered for {0}")]
    Unsupported(Platform),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("storage error: {0}")]
    Storage(#[from] AppError),
}

/// Result of syncing one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub user_id: u64,
    pub platform: Platform,
    /// Raw records returned by the platform
    pub items_fetched: usize,
    /// Records not seen before and now stored
    pub items_added: usize,
}

/// Fetch, normalize and merge saved items for one pair.
#[derive(Clone)]
pub struct SyncPipeline {
    credentials: Arc<dyn CredentialStore>,
    content: Arc<dyn ContentStore>,
    adapters: AdapterRegistry,
}

impl SyncPipeline {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        content: Arc<dyn ContentStore>,
        adapters: AdapterRegistry,
    ) -> Self {
        Self {
            credentials,
            content,
            adapters,
        }
    }

    /// Sync one (user, platform) pair.
    ///
    /// A fetch failure aborts before anything is written. Items with
    /// unparseable timestamps are still stored.
    pub async fn sync(&self, user_id: u64, platform: Platform) -> Result<SyncOutcome, SyncError> {
        let account = self
            .credentials
            .get_account(user_id, platform)
            .await?
            .ok_or(SyncError::NotLinked { user_id, platform })?;

        let adapter = self
            .adapters
            .get(platform)
            .ok_or(SyncError::Unsupported(platform))?;

        tracing::info!(user_id, platform = %platform, "Starting sync");

        let raw_items = adapter.fetch(&account.access_token).await?;
        let items_fetched = raw_items.len();

        let saved_at = Utc::now();
        let records: Vec<SavedContent> = normalize::normalize(platform, &raw_items)
            .into_iter()
            .map(|item| SavedContent::from_normalized(user_id, item, saved_at))
            .collect();

        let items_added = self.content.insert_new_content(&records).await?;

        tracing::info!(
            user_id,
            platform = %platform,
            items_fetched,
            items_added,
            "Finished sync"
        );

        Ok(SyncOutcome {
            user_id,
            platform,
            items_fetched,
            items_added,
        })
    }
}

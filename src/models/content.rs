// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved content model for storage and API.

use crate::models::{ContentType, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A platform item mapped into the unified content shape, before it is
/// attributed to a user and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub platform: Platform,
    /// Platform-native identifier, always a string
    pub original_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub content_type: ContentType,
    /// Absent when the platform timestamp could not be parsed
    pub original_published_at: Option<DateTime<Utc>>,
}

/// Stored saved-content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedContent {
    /// Document ID, derived from (user, platform, original_id)
    pub id: String,
    /// Owning user
    pub user_id: u64,
    pub platform: Platform,
    pub original_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub content_type: ContentType,
    /// Ingestion time
    pub saved_at: DateTime<Utc>,
    /// Original creation time on the platform
    pub original_published_at: Option<DateTime<Utc>>,
}

impl SavedContent {
    /// Deterministic document ID for the idempotency key.
    ///
    /// Two records with the same (user, platform, original_id) always map to
    /// the same document, so the store cannot hold duplicates.
    pub fn content_id(user_id: u64, platform: Platform, original_id: &str) -> String {
        format!(
            "{}_{}_{}",
            user_id,
            platform,
            urlencoding::encode(original_id)
        )
    }

    /// Attribute a normalized item to a user.
    pub fn from_normalized(user_id: u64, item: NormalizedItem, saved_at: DateTime<Utc>) -> Self {
        Self {
            id: Self::content_id(user_id, item.platform, &item.original_id),
            user_id,
            platform: item.platform,
            original_id: item.original_id,
            title: item.title,
            url: item.url,
            description: item.description,
            content_type: item.content_type,
            saved_at,
            original_published_at: item.original_published_at,
        }
    }
}

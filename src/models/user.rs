// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and linked platform account models.

use crate::models::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Numeric user ID (also used as document ID)
    pub user_id: u64,
    /// Email address, unique across users
    pub email: String,
    /// When the user registered
    pub registered_at: DateTime<Utc>,
}

/// One linked platform credential for one user.
///
/// Keyed by (user, platform), so a user has at most one account per platform.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAccount {
    pub user_id: u64,
    pub platform: Platform,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// When the access token expires, if the platform reports it
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlatformAccount {
    /// Document ID for the (user, platform) pair.
    pub fn doc_id(user_id: u64, platform: Platform) -> String {
        format!("{}_{}", user_id, platform)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for PlatformAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformAccount")
            .field("user_id", &self.user_id)
            .field("platform", &self.platform)
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_debug_redacts_tokens() {
        let account = PlatformAccount {
            user_id: 7,
            platform: Platform::Reddit,
            access_token: "super-secret".to_string(),
            refresh_token: Some("also-secret".to_string()),
            expires_at: None,
        };
        let rendered = format!("{:?}", account);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("also-secret"));
        assert!(rendered.contains("Reddit"));
    }

    #[test]
    fn test_account_doc_id() {
        assert_eq!(PlatformAccount::doc_id(42, Platform::Twitter), "42_twitter");
    }
}

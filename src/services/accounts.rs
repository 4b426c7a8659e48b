// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User accounts and platform linking.

use crate::config::Config;
use crate::db::{CredentialStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{Platform, PlatformAccount, User};
use crate::services::oauth::{self, TokenExchange};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

// User IDs stay within the integer range JSON clients represent exactly.
const USER_ID_MASK: u64 = (1 << 53) - 1;

/// Email-only credentials for register and login.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailForm {
    #[validate(email)]
    pub email: String,
}

#[derive(Clone)]
pub struct AccountService {
    config: Arc<Config>,
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
}

impl AccountService {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        Self {
            config,
            users,
            credentials,
            exchange,
        }
    }

    /// Register a new user. Fails with `Conflict` if the email is taken.
    pub async fn register_user(&self, form: &EmailForm, now: DateTime<Utc>) -> Result<User> {
        form.validate()?;

        let user = User {
            user_id: new_user_id(),
            email: normalize_email(&form.email),
            registered_at: now,
        };
        self.users.insert_user(&user).await?;

        tracing::info!(user_id = user.user_id, "Registered user");
        Ok(user)
    }

    /// Look up a registered user by email.
    pub async fn login(&self, form: &EmailForm) -> Result<User> {
        form.validate()?;

        self.users
            .find_user_by_email(&normalize_email(&form.email))
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Platforms the user has linked, in platform order. Empty for unknown users.
    pub async fn linked_platforms(&self, user_id: u64) -> Result<Vec<Platform>> {
        if self.users.get_user(user_id).await?.is_none() {
            return Ok(Vec::new());
        }

        let mut platforms: Vec<Platform> = self
            .credentials
            .list_accounts(user_id)
            .await?
            .into_iter()
            .map(|a| a.platform)
            .collect();
        platforms.sort();
        platforms.dedup();
        Ok(platforms)
    }

    /// Authorization URL that starts linking `platform` for `user_id`.
    pub async fn start_link(
        &self,
        user_id: u64,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<String> {
        self.require_user(user_id).await?;

        let state = oauth::sign_state(&self.config.oauth_state_key, user_id, platform, now)?;
        tracing::info!(user_id, platform = %platform, "Starting OAuth link");

        Ok(oauth::authorization_url(&self.config, platform, &state))
    }

    /// Finish the OAuth callback: verify state, exchange the code and store
    /// the user's single account for the platform.
    pub async fn complete_link(
        &self,
        platform: Platform,
        code: &str,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let user_id = oauth::verify_state(&self.config.oauth_state_key, state, platform, now)?;
        self.require_user(user_id).await?;

        let grant = self.exchange.exchange(platform, code).await?;
        let relinked = self
            .credentials
            .get_account(user_id, platform)
            .await?
            .is_some();

        self.credentials
            .upsert_account(&PlatformAccount {
                user_id,
                platform,
                access_token: grant.access_token,
                refresh_token: grant.refresh_token,
                expires_at: grant.expires_at,
            })
            .await?;

        tracing::info!(user_id, platform = %platform, relinked, "Linked platform account");
        Ok(user_id)
    }

    /// Delete the user and everything they own.
    pub async fn delete_account(&self, user_id: u64) -> Result<usize> {
        self.users.delete_user_data(user_id).await
    }

    async fn require_user(&self, user_id: u64) -> Result<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_user_id() -> u64 {
    let (high, _) = uuid::Uuid::new_v4().as_u64_pair();
    (high & USER_ID_MASK).max(1)
}

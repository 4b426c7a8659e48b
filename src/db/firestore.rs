// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Platform accounts (one document per user/platform pair)
//! - Saved content (one document per user/platform/original_id key)
//! - Reminders
//!
//! Document IDs are derived from each record's uniqueness key, so the
//! document store itself enforces "at most one" for accounts and content.

use crate::db::collections;
use crate::db::{ContentStore, CredentialStore, ReminderStore, UserStore};
use crate::error::AppError;
use crate::models::{Platform, PlatformAccount, Reminder, ReminderStatus, SavedContent, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
pub const BATCH_SIZE: usize = 400;

// Commits of one content chunk before a conflict is reported as an error.
const INSERT_ATTEMPTS: usize = 3;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Query all documents in `collection` owned by `user_id`.
    async fn query_by_user<T>(&self, collection: &str, user_id: u64) -> Result<Vec<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserStore for FirestoreDb {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User with email {} already exists",
                user.email
            )));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.user_id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Data Deletion ─────────────────────────────────

    /// Delete ALL data for a user.
    ///
    /// Deletes from all collections:
    /// - `reminders` (query by user_id)
    /// - `saved_content` (query by user_id)
    /// - `platform_accounts` (query by user_id)
    /// - `users/{user_id}`
    async fn delete_user_data(&self, user_id: u64) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Reminders first so none points at deleted content
        let reminders: Vec<Reminder> = self
            .query_by_user(collections::REMINDERS, user_id)
            .await?;
        let count = reminders.len();
        self.batch_delete(&reminders, collections::REMINDERS, |r: &Reminder| {
            r.id.clone()
        })
        .await?;
        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted reminders");

        // 2. Saved content
        let content: Vec<SavedContent> = self
            .query_by_user(collections::SAVED_CONTENT, user_id)
            .await?;
        let count = content.len();
        self.batch_delete(&content, collections::SAVED_CONTENT, |c: &SavedContent| {
            c.id.clone()
        })
        .await?;
        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted saved content");

        // 3. Platform accounts
        let accounts: Vec<PlatformAccount> = self
            .query_by_user(collections::PLATFORM_ACCOUNTS, user_id)
            .await?;
        let count = accounts.len();
        self.batch_delete(
            &accounts,
            collections::PLATFORM_ACCOUNTS,
            |a: &PlatformAccount| PlatformAccount::doc_id(a.user_id, a.platform),
        )
        .await?;
        deleted_count += count;
        tracing::debug!(user_id, count, "Deleted platform accounts");

        // 4. User profile
        if self.get_user(user_id).await?.is_some() {
            self.get_client()?
                .fluent()
                .delete()
                .from(collections::USERS)
                .document_id(user_id.to_string())
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            deleted_count += 1;
            tracing::debug!(user_id, "Deleted user profile");
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}

// ─── Platform Account Operations ─────────────────────────────

#[async_trait]
impl CredentialStore for FirestoreDb {
    async fn get_account(
        &self,
        user_id: u64,
        platform: Platform,
    ) -> Result<Option<PlatformAccount>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLATFORM_ACCOUNTS)
            .obj()
            .one(&PlatformAccount::doc_id(user_id, platform))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_accounts(&self, user_id: u64) -> Result<Vec<PlatformAccount>, AppError> {
        let mut accounts: Vec<PlatformAccount> = self
            .query_by_user(collections::PLATFORM_ACCOUNTS, user_id)
            .await?;
        accounts.sort_by_key(|a| a.platform);
        Ok(accounts)
    }

    async fn upsert_account(&self, account: &PlatformAccount) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLATFORM_ACCOUNTS)
            .document_id(PlatformAccount::doc_id(account.user_id, account.platform))
            .object(account)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Saved Content Operations ────────────────────────────────

#[async_trait]
impl ContentStore for FirestoreDb {
    async fn get_content(&self, content_id: &str) -> Result<Option<SavedContent>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SAVED_CONTENT)
            .obj()
            .one(content_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_content(
        &self,
        user_id: u64,
        platform: Option<Platform>,
    ) -> Result<Vec<SavedContent>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SAVED_CONTENT);

        let query = if let Some(platform) = platform {
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("platform").eq(platform.as_str()),
                ])
            })
        } else {
            query.filter(move |q| q.field("user_id").eq(user_id))
        };

        let mut items: Vec<SavedContent> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Timestamps are stored as strings, so order in memory rather than in the query
        items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(items)
    }

    /// Insert unseen content, one transaction per `BATCH_SIZE` chunk.
    ///
    /// Every write is create-only, so an existing document is never
    /// rewritten. When another writer creates one of the documents first the
    /// commit fails as a whole; the chunk is then re-checked and retried
    /// without the documents that now exist.
    async fn insert_new_content(&self, items: &[SavedContent]) -> Result<usize, AppError> {
        let mut seen = HashSet::new();
        let unique: Vec<&SavedContent> = items
            .iter()
            .filter(|&item| seen.insert(item.id.as_str()))
            .collect();

        let mut inserted = 0;
        for chunk in unique.chunks(BATCH_SIZE) {
            inserted += self.insert_content_chunk(chunk).await?;
        }

        Ok(inserted)
    }
}

impl FirestoreDb {
    /// Documents from `items` that do not exist yet.
    async fn absent_content<'a>(
        &self,
        items: &[&'a SavedContent],
    ) -> Result<Vec<&'a SavedContent>, AppError> {
        let client = self.get_client()?;
        let mut absent = Vec::with_capacity(items.len());

        for item in items {
            let existing: Option<SavedContent> = client
                .fluent()
                .select()
                .by_id_in(collections::SAVED_CONTENT)
                .obj()
                .one(&item.id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if existing.is_some() {
                tracing::debug!(content_id = %item.id, "Content already stored (idempotent skip)");
            } else {
                absent.push(*item);
            }
        }

        Ok(absent)
    }

    /// Create all of `items` in one transaction.
    ///
    /// Each write requires the document to be absent, so the commit fails if
    /// any of them was created in the meantime.
    async fn create_content(&self, items: &[&SavedContent]) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for item in items {
            client
                .fluent()
                .update()
                .in_col(collections::SAVED_CONTENT)
                .precondition(firestore::FirestoreWritePrecondition::Exists(false))
                .document_id(&item.id)
                .object(*item)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add content to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    /// Insert the absent part of one chunk, returning how many were created.
    async fn insert_content_chunk(&self, chunk: &[&SavedContent]) -> Result<usize, AppError> {
        let mut pending = self.absent_content(chunk).await?;
        let mut attempt = 1;

        loop {
            if pending.is_empty() {
                return Ok(0);
            }

            let err = match self.create_content(&pending).await {
                Ok(()) => return Ok(pending.len()),
                Err(e) => e,
            };

            // Only a concurrent insert of one of our keys is worth retrying
            let still_absent = self.absent_content(&pending).await?;
            if still_absent.len() == pending.len() || attempt >= INSERT_ATTEMPTS {
                return Err(err);
            }

            tracing::debug!(
                raced = pending.len() - still_absent.len(),
                attempt,
                "Content created concurrently, retrying chunk"
            );
            pending = still_absent;
            attempt += 1;
        }
    }
}

// ─── Reminder Operations ─────────────────────────────────────

#[async_trait]
impl ReminderStore for FirestoreDb {
    async fn insert_reminder(&self, reminder: &Reminder) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REMINDERS)
            .document_id(&reminder.id)
            .object(reminder)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_reminders(&self, user_id: u64) -> Result<Vec<Reminder>, AppError> {
        let mut reminders: Vec<Reminder> =
            self.query_by_user(collections::REMINDERS, user_id).await?;
        reminders.sort_by_key(|r| r.reminder_time);
        Ok(reminders)
    }

    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, AppError> {
        let scheduled: Vec<Reminder> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REMINDERS)
            .filter(|q| q.for_all([q.field("status").eq(ReminderStatus::Scheduled.as_str())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(scheduled.into_iter().filter(|r| r.is_due(now)).collect())
    }

    /// Apply status changes, one transaction per `BATCH_SIZE` chunk.
    ///
    /// Chunks commit independently, so a failure leaves earlier chunks applied.
    async fn update_reminder_statuses(
        &self,
        updates: &[(String, ReminderStatus)],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in updates.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let mut written = 0;

            for (reminder_id, status) in chunk {
                let current: Option<Reminder> = client
                    .fluent()
                    .select()
                    .by_id_in(collections::REMINDERS)
                    .obj()
                    .one(reminder_id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                let Some(mut reminder) = current else {
                    tracing::warn!(reminder_id = %reminder_id, "Reminder vanished before status update");
                    continue;
                };
                reminder.status = *status;

                client
                    .fluent()
                    .update()
                    .in_col(collections::REMINDERS)
                    .document_id(reminder_id)
                    .object(&reminder)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add reminder to transaction: {}", e))
                    })?;
                written += 1;
            }

            if written == 0 {
                let _ = transaction.rollback().await;
                continue;
            }

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
            tracing::debug!(written, "Committed reminder status chunk");
        }

        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fleet-wide sync across every linked (user, platform) pair.
//!
//! The scheduler first builds the complete pair list, then drives each pair
//! through the [`SyncPipeline`] on a bounded worker pool. Every pair gets its
//! own result; one failure never affects another pair.

use crate::db::{CredentialStore, UserStore};
use crate::error::AppError;
use crate::models::Platform;
use crate::services::sync::{SyncOutcome, SyncPipeline};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// One unit of fleet work: a user with a linked credential for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SyncPair {
    pub user_id: u64,
    pub platform: Platform,
}

/// A pair whose sync failed.
#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    pub user_id: u64,
    pub platform: Platform,
    pub error: String,
}

/// Aggregated result of a fleet run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetReport {
    /// Number of pairs attempted
    pub pairs: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Total new items across all successful pairs
    pub items_added: usize,
    pub outcomes: Vec<SyncOutcome>,
    pub failures: Vec<PairFailure>,
    /// Users whose linked accounts could not be listed
    pub users_skipped: Vec<u64>,
}

impl FleetReport {
    /// Returns true if every pair synced.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.users_skipped.is_empty()
    }

    /// Returns true if there was work and all of it failed.
    pub fn is_complete_failure(&self) -> bool {
        self.succeeded == 0 && self.failed > 0
    }

    /// Returns true if some pairs succeeded and some failed.
    pub fn is_partial_failure(&self) -> bool {
        self.succeeded > 0 && self.failed > 0
    }
}

/// Runs the sync pipeline over all pairs.
#[derive(Clone)]
pub struct FleetScheduler {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialStore>,
    pipeline: SyncPipeline,
    concurrency: usize,
}

impl FleetScheduler {
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialStore>,
        pipeline: SyncPipeline,
        concurrency: usize,
    ) -> Self {
        Self {
            users,
            credentials,
            pipeline,
            concurrency: concurrency.max(1),
        }
    }

    /// Enumerate every (user, platform) pair with a linked account.
    ///
    /// Returns the pairs plus the IDs of users whose accounts could not be read.
    pub async fn collect_pairs(&self) -> Result<(Vec<SyncPair>, Vec<u64>), AppError> {
        let users = self.users.list_users().await?;

        let mut pairs = Vec::new();
        let mut skipped = Vec::new();
        for user in users {
            match self.credentials.list_accounts(user.user_id).await {
                Ok(accounts) => pairs.extend(accounts.into_iter().map(|a| SyncPair {
                    user_id: a.user_id,
                    platform: a.platform,
                })),
                Err(e) => {
                    tracing::warn!(user_id = user.user_id, error = %e, "Failed to list linked accounts");
                    skipped.push(user.user_id);
                }
            }
        }

        pairs.sort();
        Ok((pairs, skipped))
    }

    /// Sync every linked pair, at most `concurrency` at a time.
    pub async fn run_full_sync(&self) -> Result<FleetReport, AppError> {
        let (pairs, users_skipped) = self.collect_pairs().await?;

        tracing::info!(
            pairs = pairs.len(),
            concurrency = self.concurrency,
            "Starting fleet sync"
        );

        let results: Vec<_> = stream::iter(pairs)
            .map(|pair| {
                let pipeline = self.pipeline.clone();
                async move {
                    let result = pipeline.sync(pair.user_id, pair.platform).await;
                    (pair, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = FleetReport {
            pairs: results.len(),
            users_skipped,
            ..Default::default()
        };

        for (pair, result) in results {
            match result {
                Ok(outcome) => {
                    report.succeeded += 1;
                    report.items_added += outcome.items_added;
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = pair.user_id,
                        platform = %pair.platform,
                        error = %e,
                        "Pair sync failed"
                    );
                    report.failed += 1;
                    report.failures.push(PairFailure {
                        user_id: pair.user_id,
                        platform: pair.platform,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            pairs = report.pairs,
            succeeded = report.succeeded,
            failed = report.failed,
            items_added = report.items_added,
            "Fleet sync complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_report_complete_success() {
        let report = FleetReport {
            pairs: 3,
            succeeded: 3,
            ..Default::default()
        };

        assert!(report.is_complete_success());
        assert!(!report.is_complete_failure());
        assert!(!report.is_partial_failure());
    }

    #[test]
    fn fleet_report_partial_failure() {
        let report = FleetReport {
            pairs: 3,
            succeeded: 2,
            failed: 1,
            ..Default::default()
        };

        assert!(!report.is_complete_success());
        assert!(!report.is_complete_failure());
        assert!(report.is_partial_failure());
    }

    #[test]
    fn fleet_report_complete_failure() {
        let report = FleetReport {
            pairs: 2,
            failed: 2,
            ..Default::default()
        };

        assert!(report.is_complete_failure());
        assert!(!report.is_partial_failure());
    }

    #[test]
    fn fleet_report_empty_is_success() {
        let report = FleetReport::default();

        assert!(report.is_complete_success());
        assert!(!report.is_complete_failure());
        assert!(!report.is_partial_failure());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SavedHub: aggregate saved items from content platforms
//!
//! This crate provides the backend API that syncs a user's saved items from
//! YouTube, Twitter and Reddit into one normalized store, and dispatches
//! reminders scheduled against those items.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Storage;
use services::{
    AccountService, AdapterRegistry, FleetScheduler, Notifier, ReminderProcessor,
    ReminderService, SyncPipeline, TokenExchange,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: AccountService,
    pub content: Arc<dyn db::ContentStore>,
    pub sync: SyncPipeline,
    pub fleet: FleetScheduler,
    pub reminders: ReminderService,
    pub processor: ReminderProcessor,
}

impl AppState {
    /// Wire every service over one storage backend.
    pub fn new<S: Storage>(
        config: Config,
        storage: Arc<S>,
        adapters: AdapterRegistry,
        notifier: Arc<dyn Notifier>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let config = Arc::new(config);
        let sync = SyncPipeline::new(storage.clone(), storage.clone(), adapters);

        Self {
            accounts: AccountService::new(
                config.clone(),
                storage.clone(),
                storage.clone(),
                exchange,
            ),
            content: storage.clone(),
            fleet: FleetScheduler::new(
                storage.clone(),
                storage.clone(),
                sync.clone(),
                config.sync_concurrency,
            ),
            sync,
            reminders: ReminderService::new(storage.clone(), storage.clone()),
            processor: ReminderProcessor::new(
                storage.clone(),
                storage.clone(),
                storage.clone(),
                notifier,
            ),
            config,
        }
    }
}

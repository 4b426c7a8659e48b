// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SavedHub API Server
//!
//! Syncs saved items from content platforms into one store and dispatches
//! reminders on them.

use savedhub::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryDb},
    models::Platform,
    services::{AdapterRegistry, LogNotifier, MockAdapter, MockTokenExchange, RemoteAdapter},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting SavedHub API"
    );

    let adapters = build_adapters(&config);
    let notifier = Arc::new(LogNotifier);
    let exchange = Arc::new(MockTokenExchange);
    let port = config.port;

    let state = match config.storage_backend {
        StorageBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            AppState::new(config, Arc::new(db), adapters, notifier, exchange)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            AppState::new(config, Arc::new(MemoryDb::new()), adapters, notifier, exchange)
        }
    };

    // Build router
    let app = savedhub::routes::create_router(Arc::new(state));

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Remote adapters for platforms with a configured endpoint, mocks otherwise.
fn build_adapters(config: &Config) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for platform in Platform::ALL {
        match config.api_urls.get(&platform) {
            Some(url) => {
                tracing::info!(platform = %platform, url = %url, "Using remote adapter");
                registry.register(Arc::new(RemoteAdapter::new(
                    platform,
                    url.clone(),
                    config.adapter_timeout,
                )));
            }
            None => {
                tracing::info!(platform = %platform, "Using mock adapter");
                registry.register(Arc::new(MockAdapter::new(platform, config.adapter_latency)));
            }
        }
    }
    registry
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("savedhub=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

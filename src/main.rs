// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitRank API Server
//!
//! Scores cohort leaderboards from raw weigh-in and workout logs and
//! keeps the social achievement feed free of duplicate records.

use fitrank::{
    config::{Config, StoreMode},
    db::{ActivityStore, EventLogStore, FirestoreStore, MemoryStore, UserDirectory},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FitRank API");

    // Select the store backend. All three collaborator seams are served
    // by the same backend instance.
    let (activities, events, users): (
        Arc<dyn ActivityStore>,
        Arc<dyn EventLogStore>,
        Arc<dyn UserDirectory>,
    ) = match config.store_mode {
        StoreMode::Firestore => {
            let store = Arc::new(
                FirestoreStore::new(&config.gcp_project_id)
                    .await
                    .expect("Failed to connect to Firestore"),
            );
            tracing::info!(project = %config.gcp_project_id, "Firestore store initialized");
            (store.clone(), store.clone(), store)
        }
        StoreMode::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), activities, events, users));

    // Build router
    let app = fitrank::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitrank=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitBuddy API Server
//!
//! Serves profiles, buddy matching and chat, workout logs, and fitness
//! challenges to the web client.

use fitbuddy::{
    config::{Config, StoreBackend},
    db::FirestoreDb,
    services::challenge::default_catalog,
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
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        "Starting FitBuddy API"
    );

    let db = match config.store_backend {
        StoreBackend::Firestore => FirestoreDb::new(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            FirestoreDb::new_in_memory()
        }
    };

    // Seed the challenge catalog on first start
    let seeded = db.ensure_challenge_catalog(&default_catalog()).await?;
    if seeded == 0 {
        tracing::debug!("Challenge catalog unchanged");
    }

    if config.youtube_api_key.is_none() {
        tracing::warn!("YOUTUBE_API_KEY not set; video recommendations disabled");
    }

    let port = config.port;
    let state = Arc::new(AppState::new(config, db));

    // Build router
    let app = fitbuddy::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
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
                .add_directive("fitbuddy=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

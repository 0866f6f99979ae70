// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use fitbuddy::config::Config;
use fitbuddy::db::FirestoreDb;
use fitbuddy::middleware::auth::create_jwt;
use fitbuddy::models::UserProfile;
use fitbuddy::routes::create_router;
use fitbuddy::services::challenge::default_catalog;
use fitbuddy::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app over an in-memory store seeded with the default catalog.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let db = FirestoreDb::new_in_memory();
    db.ensure_challenge_catalog(&default_catalog())
        .await
        .expect("Failed to seed catalog");

    let state = Arc::new(AppState::new(Config::test_default(), db));
    (create_router(state.clone()), state)
}

/// Create an in-memory test app with a specific frontend URL.
#[allow(dead_code)]
pub async fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();

    let state = Arc::new(AppState::new(config, FirestoreDb::new_in_memory()));
    (create_router(state.clone()), state)
}

/// Create a test app whose store calls all fail.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), test_db_offline()));
    (create_router(state.clone()), state)
}

/// Token for `uid` in session `session_id`, signed with the test key.
#[allow(dead_code)]
pub fn token_for(uid: &str, session_id: &str) -> String {
    create_jwt(uid, Some(session_id), &Config::test_default().jwt_signing_key)
        .expect("Failed to create JWT")
}

/// Send a request and decode the JSON body (`Value::Null` when empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Store a complete profile.
#[allow(dead_code)]
pub async fn seed_user(
    state: &AppState,
    uid: &str,
    username: &str,
    location: &str,
    workouts: &[&str],
    goals: &[&str],
) -> UserProfile {
    let profile = UserProfile {
        uid: uid.to_string(),
        username: Some(username.to_string()),
        age: Some(30),
        location: Some(location.to_string()),
        preferred_workouts: workouts.iter().map(|s| s.to_string()).collect(),
        fitness_goals: goals.iter().map(|s| s.to_string()).collect(),
        email: Some(format!("{}@example.com", uid)),
        ..Default::default()
    };
    state.db.upsert_user(&profile).await.unwrap();
    profile
}

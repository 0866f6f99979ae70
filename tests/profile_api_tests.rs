// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile registration, editing, and completeness prompt tests.

use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_register_then_fetch() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("user-1", "s1");

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/me",
        Some(&token),
        Some(json!({"username": "  ana  ", "age": 29, "email": "ana@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ana");

    let (status, body) = common::send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registered"], true);
    // username, age, email out of six fields
    assert_eq!(body["completeness"], 50);
    assert_eq!(body["show_profile_prompt"], true);
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("user-1", "s1");

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/me",
        Some(&token),
        Some(json!({"username": "ana", "age": 29, "email": "not-an-email"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_edit_accepts_comma_lists_and_arrays() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("user-1", "s1");

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/me",
        Some(&token),
        Some(json!({
            "location": " Boston ",
            "preferred_workouts": "Running, , Yoga ,",
            "fitness_goals": ["  Endurance", ""]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Boston");
    assert_eq!(body["preferred_workouts"], json!(["Running", "Yoga"]));
    assert_eq!(body["fitness_goals"], json!(["Endurance"]));
}

#[tokio::test]
async fn test_edit_leaves_omitted_fields_alone() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "user-1", "ana", "Boston", &["Running"], &["Endurance"]).await;
    let token = common::token_for("user-1", "s1");

    let (status, body) =
        common::send(&app, "PUT", "/api/me", Some(&token), Some(json!({"age": 31}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], 31);
    assert_eq!(body["username"], "ana");
    assert_eq!(body["preferred_workouts"], json!(["Running"]));
}

#[tokio::test]
async fn test_complete_profile_hides_prompt() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "user-1", "ana", "Boston", &["Running"], &["Endurance"]).await;
    let token = common::token_for("user-1", "s1");

    let (_, body) = common::send(&app, "GET", "/api/me", Some(&token), None).await;

    assert_eq!(body["completeness"], 100);
    assert_eq!(body["show_profile_prompt"], false);
}

#[tokio::test]
async fn test_prompt_dismissal_is_per_session() {
    let (app, _) = common::create_test_app().await;
    let first = common::token_for("user-1", "s1");
    let second = common::token_for("user-1", "s2");

    common::send(&app, "POST", "/api/me/prompt/dismiss", Some(&first), None).await;

    let (_, body) = common::send(&app, "GET", "/api/me", Some(&first), None).await;
    assert_eq!(body["show_profile_prompt"], false);

    let (_, body) = common::send(&app, "GET", "/api/me", Some(&second), None).await;
    assert_eq!(body["show_profile_prompt"], true);
}

#[tokio::test]
async fn test_public_profile_hides_private_fields() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "user-2", "bo", "Austin", &["Yoga"], &[]).await;
    let token = common::token_for("user-1", "s1");

    let (status, body) =
        common::send(&app, "GET", "/api/users/user-2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bo");
    assert!(body.get("email").is_none());
    assert!(body.get("age").is_none());

    let (status, body) =
        common::send(&app, "GET", "/api/users/nobody", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_recommendations_without_api_key_is_upstream_error() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "user-1", "ana", "Boston", &["Running"], &["Endurance"]).await;
    let token = common::token_for("user-1", "s1");

    let (status, body) =
        common::send(&app, "GET", "/api/recommendations", Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}

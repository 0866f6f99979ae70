// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog, join, and progress tests.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use fitbuddy::services::ChallengeTracker;
use serde_json::{json, Value};

mod common;

fn find<'a>(challenges: &'a Value, id: &str) -> &'a Value {
    challenges
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id || c["challenge"]["id"] == id)
        .unwrap_or_else(|| panic!("challenge {id} missing"))
}

#[tokio::test]
async fn test_catalog_lists_seeded_challenges_and_types() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");

    let (status, body) = common::send(&app, "GET", "/api/challenges", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["challenges"].as_array().unwrap().len(), 8);
    let types: Vec<&str> = body["exercise_types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert!(types.contains(&"running"));
    assert!(types.contains(&"bodyweight"));
    assert_eq!(find(&body["challenges"], "run_50_miles")["can_join"], true);
}

#[tokio::test]
async fn test_catalog_filter_by_exercise_type() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");

    let (_, body) = common::send(
        &app,
        "GET",
        "/api/challenges?exercise_type=Bodyweight",
        Some(&token),
        None,
    )
    .await;

    let ids: Vec<&str> = body["challenges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"pushup_30_day"));
    assert!(ids.contains(&"squat_500"));
    // The type list is never filtered
    assert!(body["exercise_types"].as_array().unwrap().len() > 2);
}

#[tokio::test]
async fn test_join_blocks_rejoin_while_active() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/challenges/run_50_miles/join",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["remaining_days"], 30);
    assert_eq!(body["record"]["progress"], 0.0);

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/challenges/run_50_miles/join",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, catalog) = common::send(&app, "GET", "/api/challenges", Some(&token), None).await;
    assert_eq!(find(&catalog["challenges"], "run_50_miles")["can_join"], false);
}

#[tokio::test]
async fn test_expired_challenge_can_be_rejoined_and_resets() {
    let (app, state) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");

    let mut stale = ChallengeTracker::join("ana", "run_50_miles", Utc::now() - Duration::days(40));
    stale.progress = 12.0;
    state.db.set_joined_challenge(&stale).await.unwrap();

    let (_, mine) = common::send(&app, "GET", "/api/challenges/mine", Some(&token), None).await;
    let view = find(&mine["challenges"], "run_50_miles");
    assert_eq!(view["expired"], true);
    assert_eq!(view["remaining_days"], 0);

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/challenges/run_50_miles/join",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["progress"], 0.0);
}

#[tokio::test]
async fn test_progress_is_capped_but_logged_in_full() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");
    common::send(&app, "POST", "/api/challenges/run_50_miles/join", Some(&token), None).await;

    let uri = "/api/challenges/run_50_miles/progress";
    let (status, _) =
        common::send(&app, "POST", uri, Some(&token), Some(json!({"amount": "30"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        common::send(&app, "POST", uri, Some(&token), Some(json!({"amount": 30}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["progress"], 50.0);
    assert_eq!(body["percent"], 100.0);
    assert_eq!(body["completed"], true);

    let logged: f64 = body["record"]["logs"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert_eq!(logged, 60.0);
}

#[tokio::test]
async fn test_invalid_progress_leaves_record_unchanged() {
    let (app, state) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");
    common::send(&app, "POST", "/api/challenges/squat_500/join", Some(&token), None).await;

    let uri = "/api/challenges/squat_500/progress";
    let amounts = [
        json!("abc"),
        json!("-5"),
        json!(0),
        json!(""),
        json!(true),
        json!(null),
        json!([1]),
        json!({"value": 1}),
    ];
    for amount in amounts {
        let (status, body) =
            common::send(&app, "POST", uri, Some(&token), Some(json!({"amount": amount}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
        assert_eq!(body["error"], "invalid_progress");
    }

    let (status, body) = common::send(&app, "POST", uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_progress");

    let record = state
        .db
        .get_joined_challenge("ana", "squat_500")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.progress, 0.0);
    assert!(record.logs.is_empty());
}

#[tokio::test]
async fn test_overflowing_progress_rejected_and_record_stays_readable() {
    let (app, state) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");
    common::send(&app, "POST", "/api/challenges/squat_500/join", Some(&token), None).await;

    let uri = "/api/challenges/squat_500/progress";
    let (status, _) =
        common::send(&app, "POST", uri, Some(&token), Some(json!({"amount": "1e308"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        common::send(&app, "POST", uri, Some(&token), Some(json!({"amount": "1e308"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_progress");

    let record = state
        .db
        .get_joined_challenge("ana", "squat_500")
        .await
        .unwrap()
        .unwrap();
    assert!(record.logs.values().all(|v| v.is_finite()));

    let (status, _) = common::send(&app, "GET", "/api/challenges", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, mine) =
        common::send(&app, "GET", "/api/challenges/mine", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["challenges"][0]["record"]["progress"], 500.0);
}

#[tokio::test]
async fn test_progress_requires_joined_challenge() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/challenges/squat_500/progress",
        Some(&token),
        Some(json!({"amount": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        common::send(&app, "POST", "/api/challenges/nope/join", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_complete_only_after_goal_and_earns_reward() {
    let (app, _) = common::create_test_app().await;
    let token = common::token_for("ana", "s1");
    common::send(&app, "POST", "/api/challenges/plank_master/join", Some(&token), None).await;

    let complete = "/api/challenges/plank_master/complete";
    let (status, _) = common::send(&app, "POST", complete, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::send(
        &app,
        "POST",
        "/api/challenges/plank_master/progress",
        Some(&token),
        Some(json!({"amount": 10})),
    )
    .await;

    let (status, body) = common::send(&app, "POST", complete, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["status"], "completed");

    let (_, mine) = common::send(&app, "GET", "/api/challenges/mine", Some(&token), None).await;
    assert_eq!(mine["rewards"], json!(["🧱 Core Crusher Badge"]));

    // Completed challenges may be joined again
    let (status, _) =
        common::send(&app, "POST", "/api/challenges/plank_master/join", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
}

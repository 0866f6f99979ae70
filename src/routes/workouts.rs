// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout log routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Workout, WorkoutInput};
use crate::time_utils::is_valid_date_key;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route(
            "/api/workouts/{id}",
            put(update_workout).delete(delete_workout),
        )
}

/// Checks beyond what the derive covers.
fn check_input(input: &WorkoutInput) -> Result<()> {
    input.validate()?;
    if input.workout_type.trim().is_empty() {
        return Err(AppError::BadRequest("workout_type must not be blank".to_string()));
    }
    if !is_valid_date_key(&input.date) {
        return Err(AppError::BadRequest(format!(
            "date must be YYYY-MM-DD, got '{}'",
            input.date
        )));
    }
    Ok(())
}

/// Load one of the caller's workouts. Other users' workouts read as missing.
async fn load_own_workout(state: &AppState, uid: &str, id: &str) -> Result<Workout> {
    state
        .db
        .get_workout(id)
        .await?
        .filter(|w| w.user_id == uid)
        .ok_or_else(|| AppError::NotFound(format!("Workout {} not found", id)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutsResponse {
    pub workouts: Vec<Workout>,
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WorkoutsResponse>> {
    let workouts = state.db.list_workouts(&user.uid).await?;
    tracing::debug!(uid = %user.uid, count = workouts.len(), "Listed workouts");
    Ok(Json(WorkoutsResponse { workouts }))
}

async fn create_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<WorkoutInput>,
) -> Result<(StatusCode, Json<Workout>)> {
    check_input(&input)?;

    let workout = Workout::new(&user.uid, input, Utc::now());
    state.db.set_workout(&workout).await?;

    tracing::info!(
        uid = %user.uid,
        workout_id = %workout.id,
        workout_type = %workout.workout_type,
        "Workout logged"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn update_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(input): Json<WorkoutInput>,
) -> Result<Json<Workout>> {
    check_input(&input)?;

    let mut workout = load_own_workout(&state, &user.uid, &id).await?;
    workout.apply(input);
    workout.updated_at = Some(Utc::now());
    state.db.set_workout(&workout).await?;

    tracing::info!(uid = %user.uid, workout_id = %id, "Workout updated");
    Ok(Json(workout))
}

async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    load_own_workout(&state, &user.uid, &id).await?;
    state.db.delete_workout(&id).await?;

    tracing::info!(uid = %user.uid, workout_id = %id, "Workout deleted");
    Ok(StatusCode::NO_CONTENT)
}

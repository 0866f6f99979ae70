// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: registration, editing, public lookup, and video
//! recommendations.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::{clean_list, parse_list};
use crate::models::{PublicProfile, UserProfile};
use crate::services::videos::VideoItem;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(register).put(update_profile))
        .route("/api/me/prompt/dismiss", post(dismiss_prompt))
        .route("/api/users/{uid}", get(get_public_profile))
        .route("/api/recommendations", get(get_recommendations))
}

/// Load the caller's profile, or fail if they never registered.
pub(crate) async fn require_profile(state: &AppState, uid: &str) -> Result<UserProfile> {
    state
        .db
        .get_user(uid)
        .await?
        .ok_or_else(|| AppError::ProfileIncomplete("Profile not found; register first".to_string()))
}

// ─── Current User ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub profile: UserProfile,
    /// False until the user has registered
    pub registered: bool,
    pub completeness: u32,
    pub show_profile_prompt: bool,
}

/// Get the caller's profile and whether to nag them about completing it.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let stored = state.db.get_user(&user.uid).await?;
    let registered = stored.is_some();
    let profile = stored.unwrap_or_else(|| UserProfile {
        uid: user.uid.clone(),
        ..Default::default()
    });

    let completeness = profile.completeness_percent();
    let dismissed = state
        .sessions
        .snapshot(&user.session_id)
        .profile_prompt_dismissed();

    Ok(Json(MeResponse {
        profile,
        registered,
        completeness,
        show_profile_prompt: completeness < 100 && !dismissed,
    }))
}

/// Hide the completeness prompt for the rest of this session.
async fn dismiss_prompt(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> StatusCode {
    state
        .sessions
        .with_session(&user.session_id, user.expires_at, |s| {
            s.dismiss_profile_prompt()
        });
    StatusCode::NO_CONTENT
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(range(min = 1, max = 150))]
    pub age: u32,
    #[validate(email)]
    pub email: String,
}

/// Create the caller's profile after sign-up.
///
/// Fields set by earlier activity (such as chat links) survive.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    body.validate()?;
    let username = body.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("username must not be blank".to_string()));
    }

    let now = Utc::now();
    let mut profile = state.db.get_user(&user.uid).await?.unwrap_or_else(|| UserProfile {
        uid: user.uid.clone(),
        ..Default::default()
    });
    profile.username = Some(username.to_string());
    profile.age = Some(body.age);
    profile.email = Some(body.email.trim().to_string());
    profile.created_at.get_or_insert(now);
    profile.updated_at = Some(now);

    state.db.upsert_user(&profile).await?;
    tracing::info!(uid = %user.uid, "User registered");

    Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Profile Edit ────────────────────────────────────────────

/// A list given either as comma-separated text or as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Text(String),
    Items(Vec<String>),
}

impl ListInput {
    fn into_list(self) -> Vec<String> {
        match self {
            ListInput::Text(raw) => parse_list(&raw),
            ListInput::Items(items) => clean_list(items),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50))]
    pub username: Option<String>,
    #[validate(range(min = 1, max = 150))]
    pub age: Option<u32>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub preferred_workouts: Option<ListInput>,
    pub fitness_goals: Option<ListInput>,
}

/// Blank text clears an optional field.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Edit the caller's profile. Omitted fields are left unchanged.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    body.validate()?;

    let now = Utc::now();
    let mut profile = state.db.get_user(&user.uid).await?.unwrap_or_else(|| UserProfile {
        uid: user.uid.clone(),
        created_at: Some(now),
        ..Default::default()
    });

    if let Some(username) = body.username {
        profile.username = non_blank(username);
    }
    if let Some(age) = body.age {
        profile.age = Some(age);
    }
    if let Some(location) = body.location {
        profile.location = non_blank(location);
    }
    if let Some(workouts) = body.preferred_workouts {
        profile.preferred_workouts = workouts.into_list();
    }
    if let Some(goals) = body.fitness_goals {
        profile.fitness_goals = goals.into_list();
    }
    profile.updated_at = Some(now);

    state.db.upsert_user(&profile).await?;
    tracing::info!(
        uid = %user.uid,
        completeness = profile.completeness_percent(),
        "Profile updated"
    );

    Ok(Json(profile))
}

// ─── Other Users ─────────────────────────────────────────────

/// Look up another user, e.g. a chat partner.
async fn get_public_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<PublicProfile>> {
    let profile = state
        .db
        .get_user(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;

    Ok(Json(PublicProfile::from(&profile)))
}

// ─── Recommendations ─────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecommendationsResponse {
    pub videos: Vec<VideoItem>,
}

/// Workout videos matching the caller's goals and workouts.
async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecommendationsResponse>> {
    let profile = require_profile(&state, &user.uid).await?;
    let videos = state.video_service.recommend(&profile).await?;

    tracing::debug!(uid = %user.uid, count = videos.len(), "Video recommendations");
    Ok(Json(RecommendationsResponse { videos }))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog and participation routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChallengeDefinition, JoinedChallenge};
use crate::services::ChallengeTracker;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/mine", get(my_challenges))
        .route("/api/challenges/{id}/join", post(join_challenge))
        .route("/api/challenges/{id}/progress", post(add_progress))
        .route("/api/challenges/{id}/complete", post(complete_challenge))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Only show challenges of this exercise type (case-insensitive)
    pub exercise_type: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub challenge: ChallengeDefinition,
    pub can_join: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatalogResponse {
    pub challenges: Vec<CatalogEntry>,
    /// Every exercise type in the catalog, for the filter control
    pub exercise_types: Vec<String>,
}

/// List challenges, optionally filtered, with whether the caller may join each.
async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>> {
    let catalog = state.db.list_challenges().await?;
    let joined: HashMap<String, JoinedChallenge> = state
        .db
        .list_joined_challenges(&user.uid)
        .await?
        .into_iter()
        .map(|r| (r.challenge_id.clone(), r))
        .collect();

    let exercise_types: Vec<String> = catalog
        .iter()
        .map(|c| c.exercise_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let filter = query
        .exercise_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let now = Utc::now();
    let challenges = catalog
        .into_iter()
        .filter(|c| filter.map_or(true, |t| c.exercise_type.eq_ignore_ascii_case(t)))
        .map(|challenge| CatalogEntry {
            can_join: ChallengeTracker::can_join(&challenge, joined.get(&challenge.id), now),
            challenge,
        })
        .collect();

    Ok(Json(CatalogResponse {
        challenges,
        exercise_types,
    }))
}

// ─── Participation ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JoinedChallengeView {
    pub challenge: ChallengeDefinition,
    pub record: JoinedChallenge,
    pub remaining_days: u32,
    pub percent: f64,
    pub completed: bool,
    pub expired: bool,
    pub ends_at: String,
}

impl JoinedChallengeView {
    fn new(challenge: ChallengeDefinition, record: JoinedChallenge, now: DateTime<Utc>) -> Self {
        Self {
            remaining_days: ChallengeTracker::remaining_days(
                record.joined_at,
                challenge.duration_days,
                now,
            ),
            percent: ChallengeTracker::percent(&challenge, &record),
            completed: ChallengeTracker::is_completed(&challenge, &record),
            expired: ChallengeTracker::is_expired(&challenge, &record, now),
            ends_at: format_utc_rfc3339(ChallengeTracker::ends_at(
                record.joined_at,
                challenge.duration_days,
            )),
            challenge,
            record,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MyChallengesResponse {
    pub challenges: Vec<JoinedChallengeView>,
    /// Rewards of every completed challenge
    pub rewards: Vec<String>,
}

/// The caller's joined challenges, most recently joined first.
async fn my_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MyChallengesResponse>> {
    let catalog: HashMap<String, ChallengeDefinition> = state
        .db
        .list_challenges()
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

    let mut records = state.db.list_joined_challenges(&user.uid).await?;
    records.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));

    let now = Utc::now();
    let mut challenges = Vec::with_capacity(records.len());
    for record in records {
        let Some(challenge) = catalog.get(&record.challenge_id).cloned() else {
            tracing::warn!(
                uid = %user.uid,
                challenge_id = %record.challenge_id,
                "Joined challenge has no catalog entry"
            );
            continue;
        };
        challenges.push(JoinedChallengeView::new(challenge, record, now));
    }

    let rewards = challenges
        .iter()
        .filter(|c| c.completed)
        .map(|c| c.challenge.reward.clone())
        .collect();

    Ok(Json(MyChallengesResponse {
        challenges,
        rewards,
    }))
}

/// Look up a catalog entry or 404.
async fn load_challenge(state: &AppState, id: &str) -> Result<ChallengeDefinition> {
    state
        .db
        .get_challenge(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", id)))
}

/// Look up the caller's participation record or 404.
async fn load_record(state: &AppState, uid: &str, id: &str) -> Result<JoinedChallenge> {
    state
        .db
        .get_joined_challenge(uid, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not joined", id)))
}

/// Join (or re-join) a challenge.
async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JoinedChallengeView>)> {
    let challenge = load_challenge(&state, &id).await?;
    let existing = state.db.get_joined_challenge(&user.uid, &id).await?;

    let now = Utc::now();
    if !ChallengeTracker::can_join(&challenge, existing.as_ref(), now) {
        return Err(AppError::Conflict(format!(
            "Challenge {} is already in progress",
            id
        )));
    }

    let record = ChallengeTracker::join(&user.uid, &id, now);
    state.db.set_joined_challenge(&record).await?;

    tracing::info!(
        uid = %user.uid,
        challenge_id = %id,
        rejoined = existing.is_some(),
        "Challenge joined"
    );

    Ok((
        StatusCode::CREATED,
        Json(JoinedChallengeView::new(challenge, record, now)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
    /// A JSON number or a numeric string, as typed by the user
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

impl ProgressBody {
    /// The amount as text for [`ChallengeTracker::add_progress`].
    fn amount_text(&self) -> Result<String> {
        match &self.amount {
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(AppError::InvalidProgress(format!(
                "amount must be a number, got {}",
                other
            ))),
            None => Err(AppError::InvalidProgress("amount is required".to_string())),
        }
    }
}

/// Add progress to a joined challenge.
async fn add_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ProgressBody>,
) -> Result<Json<JoinedChallengeView>> {
    let challenge = load_challenge(&state, &id).await?;
    let mut record = load_record(&state, &user.uid, &id).await?;

    let amount = body.amount_text()?;
    let now = Utc::now();
    let progress = ChallengeTracker::add_progress(&challenge, &mut record, &amount, now)?;
    state.db.set_joined_challenge(&record).await?;

    tracing::info!(
        uid = %user.uid,
        challenge_id = %id,
        progress,
        goal = challenge.goal_value,
        "Challenge progress recorded"
    );

    Ok(Json(JoinedChallengeView::new(challenge, record, now)))
}

/// Mark a joined challenge completed once its goal is reached.
async fn complete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<JoinedChallengeView>> {
    let challenge = load_challenge(&state, &id).await?;
    let mut record = load_record(&state, &user.uid, &id).await?;

    let now = Utc::now();
    ChallengeTracker::mark_completed(&challenge, &mut record, now)?;
    state.db.set_joined_challenge(&record).await?;

    tracing::info!(uid = %user.uid, challenge_id = %id, "Challenge completed");
    Ok(Json(JoinedChallengeView::new(challenge, record, now)))
}

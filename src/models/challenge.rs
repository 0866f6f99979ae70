// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog entries and per-user participation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest challenge the catalog accepts (about a century).
pub const MAX_DURATION_DAYS: u32 = 36_500;

/// What a challenge's goal value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Distance,
    Consistency,
    Count,
}

/// Static catalog entry (keyed by `id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    pub goal_value: f64,
    pub duration_days: u32,
    pub reward: String,
    /// Used for catalog filtering (e.g. "running", "yoga")
    pub exercise_type: String,
    pub image_url: String,
}

impl ChallengeDefinition {
    /// Check the numeric constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.goal_value.is_finite() && self.goal_value > 0.0) {
            return Err(format!("goal_value must be positive, got {}", self.goal_value));
        }
        if self.duration_days == 0 {
            return Err("duration_days must be positive".to_string());
        }
        if self.duration_days > MAX_DURATION_DAYS {
            return Err(format!(
                "duration_days must be at most {}, got {}",
                MAX_DURATION_DAYS, self.duration_days
            ));
        }
        Ok(())
    }
}

/// Stored participation status.
///
/// This is not kept in sync with progress automatically; use
/// `ChallengeTracker::is_completed` for the derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    #[default]
    InProgress,
    Completed,
}

/// A user's participation in one challenge.
///
/// Stored in `joined_challenges`; see [`JoinedChallenge::doc_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JoinedChallenge {
    pub user_id: String,
    pub challenge_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub progress: f64,
    /// Amount added per calendar day ("YYYY-MM-DD")
    #[serde(default)]
    pub logs: BTreeMap<String, f64>,
    #[serde(default)]
    pub status: ChallengeStatus,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JoinedChallenge {
    /// Document ID for a (user, challenge) pair.
    ///
    /// Both parts are percent-encoded, so the `:` separator only ever
    /// appears between them.
    pub fn doc_id(user_id: &str, challenge_id: &str) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(user_id),
            urlencoding::encode(challenge_id)
        )
    }

    pub fn belongs_to(&self, user_id: &str, challenge_id: &str) -> bool {
        self.user_id == user_id && self.challenge_id == challenge_id
    }
}

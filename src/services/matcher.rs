// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Buddy matching: score other users by shared workouts, goals and location.

use crate::error::AppError;
use crate::models::UserProfile;
use serde::Serialize;

/// Points per workout or goal the two users share.
pub const SHARED_ITEM_POINTS: u32 = 5;
/// Flat bonus when both users list the same location.
pub const SAME_LOCATION_POINTS: u32 = 10;
/// Maximum number of ranked matches returned.
pub const MAX_MATCHES: usize = 5;

/// A candidate profile with its match score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuddyMatch {
    pub profile: UserProfile,
    pub score: u32,
}

/// Scores and ranks candidate buddies.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuddyMatcher;

impl BuddyMatcher {
    /// Score `candidate` against `current`.
    pub fn score(current: &UserProfile, candidate: &UserProfile) -> u32 {
        let shared_workouts =
            shared_count(&current.preferred_workouts, &candidate.preferred_workouts);
        let shared_goals = shared_count(&current.fitness_goals, &candidate.fitness_goals);

        let mut score = (shared_workouts + shared_goals) * SHARED_ITEM_POINTS;
        if same_location(current.location.as_deref(), candidate.location.as_deref()) {
            score += SAME_LOCATION_POINTS;
        }
        score
    }

    /// Rank `all_profiles` for `current_uid`.
    ///
    /// `all_profiles` must contain the current user's own profile; its order
    /// breaks ties between equal scores.
    pub fn rank(current_uid: &str, all_profiles: &[UserProfile]) -> Result<Vec<BuddyMatch>, AppError> {
        let current = all_profiles
            .iter()
            .find(|p| p.uid == current_uid)
            .ok_or_else(|| {
                AppError::ProfileIncomplete(
                    "Update your profile to find matches".to_string(),
                )
            })?;

        let mut matches: Vec<BuddyMatch> = all_profiles
            .iter()
            .filter(|p| p.uid != current_uid)
            .filter_map(|candidate| {
                let score = Self::score(current, candidate);
                (score > 0).then(|| BuddyMatch {
                    profile: candidate.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps input order for equal scores
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches.truncate(MAX_MATCHES);

        tracing::debug!(
            uid = %current_uid,
            candidates = all_profiles.len().saturating_sub(1),
            matched = matches.len(),
            "Ranked buddy matches"
        );

        Ok(matches)
    }
}

/// Count entries of `mine` that also appear in `theirs`, ignoring case.
///
/// Duplicates in `mine` are counted each time.
fn shared_count(mine: &[String], theirs: &[String]) -> u32 {
    let theirs: Vec<String> = theirs.iter().map(|s| s.to_lowercase()).collect();
    mine.iter()
        .filter(|item| theirs.contains(&item.to_lowercase()))
        .count() as u32
}

fn same_location(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge eligibility, time remaining, and progress tracking.
//!
//! All functions take the current time explicitly. Callers pass
//! `Utc::now()`; tests pass fixed instants.

use crate::error::AppError;
use crate::models::{ChallengeDefinition, ChallengeStatus, GoalType, JoinedChallenge};
use crate::time_utils::date_key;
use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Stateless challenge rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeTracker;

impl ChallengeTracker {
    /// Moment at which a joined challenge runs out. Saturates at the
    /// latest representable instant.
    pub fn ends_at(joined_at: DateTime<Utc>, duration_days: u32) -> DateTime<Utc> {
        joined_at
            .checked_add_signed(Duration::days(i64::from(duration_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// A record is expired once its full duration has elapsed.
    pub fn is_expired(def: &ChallengeDefinition, record: &JoinedChallenge, now: DateTime<Utc>) -> bool {
        now >= Self::ends_at(record.joined_at, def.duration_days)
    }

    /// Derived completion: progress has reached the goal.
    pub fn is_completed(def: &ChallengeDefinition, record: &JoinedChallenge) -> bool {
        record.progress >= def.goal_value
    }

    /// A user may join when they have no record, or the record is expired or
    /// completed. An active record blocks re-joining.
    pub fn can_join(
        def: &ChallengeDefinition,
        record: Option<&JoinedChallenge>,
        now: DateTime<Utc>,
    ) -> bool {
        match record {
            None => true,
            Some(record) => Self::is_expired(def, record, now) || Self::is_completed(def, record),
        }
    }

    /// Fresh participation record. Replaces any earlier record for the pair.
    pub fn join(user_id: &str, challenge_id: &str, now: DateTime<Utc>) -> JoinedChallenge {
        JoinedChallenge {
            user_id: user_id.to_string(),
            challenge_id: challenge_id.to_string(),
            joined_at: now,
            progress: 0.0,
            logs: Default::default(),
            status: ChallengeStatus::InProgress,
            updated_at: None,
            completed_at: None,
        }
    }

    /// Whole days left, rounded up and never negative.
    pub fn remaining_days(joined_at: DateTime<Utc>, duration_days: u32, now: DateTime<Utc>) -> u32 {
        let left_ms = (Self::ends_at(joined_at, duration_days) - now).num_milliseconds();
        if left_ms <= 0 {
            return 0;
        }
        // ceil for positive values
        ((left_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY) as u32
    }

    /// Parse a user-entered progress amount.
    pub fn parse_delta(raw: &str) -> Result<f64, AppError> {
        let trimmed = raw.trim();
        let delta: f64 = trimmed
            .parse()
            .map_err(|_| AppError::InvalidProgress(format!("'{}' is not a number", trimmed)))?;

        if !delta.is_finite() || delta <= 0.0 {
            return Err(AppError::InvalidProgress(format!(
                "progress must be a positive number, got {}",
                trimmed
            )));
        }
        Ok(delta)
    }

    /// Add `raw_delta` to a record.
    ///
    /// Stored progress is capped at the goal; the excess is dropped. Today's
    /// log entry receives the full requested amount, so once the goal is
    /// reached the logs can add up to more than `progress`.
    ///
    /// On error the record is left untouched.
    pub fn add_progress(
        def: &ChallengeDefinition,
        record: &mut JoinedChallenge,
        raw_delta: &str,
        now: DateTime<Utc>,
    ) -> Result<f64, AppError> {
        let delta = Self::parse_delta(raw_delta)?;

        let day = date_key(now);
        let logged = record.logs.get(&day).copied().unwrap_or(0.0) + delta;
        if !logged.is_finite() {
            return Err(AppError::InvalidProgress(format!(
                "progress of {} is too large to record",
                raw_delta.trim()
            )));
        }

        record.progress = (record.progress + delta).min(def.goal_value);
        record.logs.insert(day, logged);
        record.updated_at = Some(now);

        Ok(record.progress)
    }

    /// Explicitly mark a record completed. Only allowed once the goal is met.
    pub fn mark_completed(
        def: &ChallengeDefinition,
        record: &mut JoinedChallenge,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !Self::is_completed(def, record) {
            return Err(AppError::BadRequest(format!(
                "Challenge goal not reached yet ({}/{})",
                record.progress, def.goal_value
            )));
        }
        record.status = ChallengeStatus::Completed;
        record.completed_at.get_or_insert(now);
        Ok(())
    }

    /// Progress as a percentage of the goal, capped at 100.
    pub fn percent(def: &ChallengeDefinition, record: &JoinedChallenge) -> f64 {
        ((record.progress / def.goal_value) * 100.0).min(100.0)
    }
}

/// Built-in catalog seeded into an empty store.
pub fn default_catalog() -> Vec<ChallengeDefinition> {
    let entry = |id: &str,
                 title: &str,
                 description: &str,
                 goal_type: GoalType,
                 goal_value: f64,
                 duration_days: u32,
                 reward: &str,
                 exercise_type: &str,
                 image: &str| ChallengeDefinition {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        goal_type,
        goal_value,
        duration_days,
        reward: reward.to_string(),
        exercise_type: exercise_type.to_string(),
        image_url: format!(
            "https://images.unsplash.com/{}?auto=format&fit=crop&w=800&q=80",
            image
        ),
    };

    vec![
        entry(
            "run_50_miles",
            "Run 50 Miles in a Month",
            "Complete 50 miles of running within 30 days",
            GoalType::Distance,
            50.0,
            30,
            "🏅 50-Mile Finisher Badge",
            "running",
            "photo-1605301627799-9c9eb5f75574",
        ),
        entry(
            "pushup_30_day",
            "30-Day Push-Up Challenge",
            "Do push-ups daily for 30 days",
            GoalType::Consistency,
            30.0,
            30,
            "💪 Push-Up Pro Badge",
            "bodyweight",
            "photo-1605296867304-46d5465a13f1",
        ),
        entry(
            "morning_yoga",
            "Morning Yoga Routine",
            "Do a 15-min morning yoga routine for 15 days",
            GoalType::Consistency,
            15.0,
            20,
            "🧘 Yoga Starter Badge",
            "yoga",
            "photo-1540206395-68808572332f",
        ),
        entry(
            "climb_100_floors",
            "Climb 100 Floors",
            "Use stairs or stair machine to climb 100 floors",
            GoalType::Count,
            100.0,
            25,
            "🏆 Stair Master Badge",
            "stair_climbing",
            "photo-1571019613578-2b78e9126f6e",
        ),
        entry(
            "cycle_100_km",
            "Cycle 100 KM in 2 Weeks",
            "Ride a total of 100 kilometers in 14 days",
            GoalType::Distance,
            100.0,
            14,
            "🚴 Cycling Champ Badge",
            "cycling",
            "photo-1518655048521-f130df041f66",
        ),
        entry(
            "squat_500",
            "500 Squats in a Week",
            "Complete 500 squats in 7 days",
            GoalType::Count,
            500.0,
            7,
            "🏋️ Squat Beast Badge",
            "bodyweight",
            "photo-1605296867422-28b4a41c7008",
        ),
        entry(
            "plank_master",
            "Plank Master Challenge",
            "Hold a plank for 2 minutes daily for 10 days",
            GoalType::Consistency,
            10.0,
            12,
            "🧱 Core Crusher Badge",
            "core",
            "photo-1612287230202-b80f8c3d1bba",
        ),
        entry(
            "evening_walks",
            "Evening Walk Challenge",
            "Walk at least 2 km every evening for 20 days",
            GoalType::Consistency,
            20.0,
            25,
            "🚶 Walk Warrior Badge",
            "walking",
            "photo-1505236732316-920f94d52d71",
        ),
    ]
}

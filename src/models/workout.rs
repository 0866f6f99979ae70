// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Logged workout model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Workout types that record a distance.
pub const DISTANCE_WORKOUTS: [&str; 4] = ["Running", "Cycling", "Swimming", "Walking"];
/// Workout type that records weight, reps and sets.
pub const STRENGTH_WORKOUT: &str = "Weightlifting";

/// Stored workout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub workout_type: String,
    /// Day the workout happened ("YYYY-MM-DD")
    pub date: String,
    /// Duration in minutes
    pub duration: f64,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub notes: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub logged_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Workout fields accepted from the client on create and update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkoutInput {
    #[validate(length(min = 1, max = 50))]
    pub workout_type: String,
    #[validate(length(equal = 10))]
    pub date: String,
    #[validate(range(exclusive_min = 0.0))]
    pub duration: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub distance: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: Option<f64>,
    #[validate(range(min = 1))]
    pub reps: Option<u32>,
    #[validate(range(min = 1))]
    pub sets: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: String,
}

/// Type-dependent fields after dropping the ones that don't apply.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkoutMetrics {
    pub distance: Option<f64>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
}

impl WorkoutInput {
    /// Keep only the measurements that make sense for this workout type.
    pub fn metrics(&self) -> WorkoutMetrics {
        if DISTANCE_WORKOUTS.contains(&self.workout_type.as_str()) {
            WorkoutMetrics {
                distance: self.distance,
                ..Default::default()
            }
        } else if self.workout_type == STRENGTH_WORKOUT {
            WorkoutMetrics {
                weight: self.weight,
                reps: self.reps,
                sets: self.sets,
                ..Default::default()
            }
        } else {
            WorkoutMetrics::default()
        }
    }
}

impl Workout {
    /// New workout for `user_id` with a fresh ID.
    pub fn new(user_id: &str, input: WorkoutInput, now: DateTime<Utc>) -> Self {
        let mut workout = Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            workout_type: String::new(),
            date: String::new(),
            duration: 0.0,
            distance: None,
            weight: None,
            reps: None,
            sets: None,
            notes: String::new(),
            logged_at: now,
            updated_at: None,
        };
        workout.apply(input);
        workout
    }

    /// Replace the user-editable fields. Metrics that don't fit the
    /// (possibly new) workout type are cleared.
    pub fn apply(&mut self, input: WorkoutInput) {
        let metrics = input.metrics();
        self.workout_type = input.workout_type.trim().to_string();
        self.date = input.date;
        self.duration = input.duration;
        self.distance = metrics.distance;
        self.weight = metrics.weight;
        self.reps = metrics.reps;
        self.sets = metrics.sets;
        self.notes = input.notes.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(workout_type: &str) -> WorkoutInput {
        WorkoutInput {
            workout_type: workout_type.to_string(),
            date: "2024-05-01".to_string(),
            duration: 45.0,
            distance: Some(5.0),
            weight: Some(60.0),
            reps: Some(10),
            sets: Some(3),
            notes: String::new(),
        }
    }

    #[test]
    fn test_distance_workout_keeps_only_distance() {
        let metrics = input("Cycling").metrics();
        assert_eq!(metrics.distance, Some(5.0));
        assert_eq!(metrics.weight, None);
        assert_eq!(metrics.reps, None);
    }

    #[test]
    fn test_strength_workout_keeps_weight_reps_sets() {
        let metrics = input("Weightlifting").metrics();
        assert_eq!(metrics.distance, None);
        assert_eq!(metrics.weight, Some(60.0));
        assert_eq!(metrics.sets, Some(3));
    }

    #[test]
    fn test_other_workout_drops_everything() {
        assert_eq!(input("Yoga").metrics(), WorkoutMetrics::default());
    }

    #[test]
    fn test_apply_clears_metrics_on_type_change() {
        let now = Utc::now();
        let mut workout = Workout::new("u1", input("Running"), now);
        assert_eq!(workout.distance, Some(5.0));

        let mut edit = input("Weightlifting");
        edit.notes = "  heavy day  ".to_string();
        workout.apply(edit);

        assert_eq!(workout.distance, None);
        assert_eq!(workout.reps, Some(10));
        assert_eq!(workout.notes, "heavy day");
        assert_eq!(workout.logged_at, now);
    }

    #[test]
    fn test_validation_rejects_non_positive_duration() {
        let mut bad = input("Running");
        bad.duration = 0.0;
        assert!(bad.validate().is_err());
        assert!(input("Running").validate().is_ok());
    }
}

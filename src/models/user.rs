// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of fields that count towards profile completeness.
const COMPLETENESS_FIELDS: u32 = 6;

/// User profile stored in Firestore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Identity from the auth provider (also used as document ID)
    pub uid: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    /// Free-text location (e.g. "Boston")
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub preferred_workouts: Vec<String>,
    #[serde(default)]
    pub fitness_goals: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Chat room IDs this user participates in
    #[serde(default)]
    pub chats: BTreeMap<String, bool>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Percentage (0-100) of the required profile fields that are filled in.
    pub fn completeness_percent(&self) -> u32 {
        let filled = [
            is_filled(self.username.as_deref()),
            self.age.is_some_and(|age| age > 0),
            is_filled(self.location.as_deref()),
            any_filled(&self.preferred_workouts),
            any_filled(&self.fitness_goals),
            is_filled(self.email.as_deref()),
        ]
        .into_iter()
        .filter(|&f| f)
        .count() as u32;

        ((filled as f64 / COMPLETENESS_FIELDS as f64) * 100.0).round() as u32
    }

    /// Display name, falling back for profiles without a username.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or("Anonymous User")
    }
}

/// What other users may see of a profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicProfile {
    pub uid: String,
    pub username: String,
    pub location: Option<String>,
    pub preferred_workouts: Vec<String>,
    pub fitness_goals: Vec<String>,
    pub photo_url: Option<String>,
}

impl From<&UserProfile> for PublicProfile {
    fn from(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            username: profile.display_name().to_string(),
            location: profile.location.clone(),
            preferred_workouts: profile.preferred_workouts.clone(),
            fitness_goals: profile.fitness_goals.clone(),
            photo_url: profile.photo_url.clone(),
        }
    }
}

fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn any_filled(values: &[String]) -> bool {
    values.iter().any(|v| !v.trim().is_empty())
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Trim entries of an already-split list and drop empty ones.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> UserProfile {
        UserProfile {
            uid: "u1".to_string(),
            username: Some("ana".to_string()),
            age: Some(31),
            location: Some("Boston".to_string()),
            preferred_workouts: vec!["Running".to_string()],
            fitness_goals: vec!["Endurance".to_string()],
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_profile_is_complete() {
        assert_eq!(full_profile().completeness_percent(), 100);
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let profile = UserProfile {
            location: Some("   ".to_string()),
            preferred_workouts: vec![" ".to_string()],
            age: Some(0),
            ..full_profile()
        };

        // 3 of 6 fields filled
        assert_eq!(profile.completeness_percent(), 50);
    }

    #[test]
    fn test_completeness_rounds() {
        let profile = UserProfile {
            uid: "u2".to_string(),
            email: Some("x@example.com".to_string()),
            ..Default::default()
        };

        // 1 of 6 = 16.67%
        assert_eq!(profile.completeness_percent(), 17);
    }

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        assert_eq!(
            parse_list(" Running, ,Yoga ,"),
            vec!["Running".to_string(), "Yoga".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let profile: UserProfile = serde_json::from_str(r#"{"uid":"abc"}"#).unwrap();
        assert_eq!(profile.uid, "abc");
        assert!(profile.preferred_workouts.is_empty());
        assert_eq!(profile.display_name(), "Anonymous User");
    }
}

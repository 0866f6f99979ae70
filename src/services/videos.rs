// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout video recommendations via the YouTube Data API.

use crate::error::AppError;
use crate::models::UserProfile;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Videos returned per recommendation request.
pub const MAX_VIDEOS: u32 = 9;
/// Term appended to every search.
const QUERY_SUFFIX: &str = "workout";

/// A recommended video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VideoItem {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub embed_url: String,
}

/// Build the search query: goals and workouts OR-ed together, plus a fixed suffix.
pub fn build_search_query(profile: &UserProfile) -> String {
    let terms: Vec<&str> = profile
        .fitness_goals
        .iter()
        .chain(profile.preferred_workouts.iter())
        .map(String::as_str)
        .collect();
    format!("{} {}", terms.join(" OR "), QUERY_SUFFIX)
}

/// YouTube search client.
#[derive(Clone)]
pub struct VideoService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VideoService {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, "https://www.googleapis.com/youtube/v3")
    }

    /// Point the client at a different API root (for tests and proxies).
    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Search for videos matching a user's goals and workouts.
    pub async fn recommend(&self, profile: &UserProfile) -> Result<Vec<VideoItem>, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("Video search is not configured".to_string()))?;

        let query = build_search_query(profile);
        let url = format!("{}/search", self.base_url);
        let max_results = MAX_VIDEOS.to_string();

        tracing::debug!(uid = %profile.uid, query = %query, "Searching workout videos");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query.as_str()),
                ("key", api_key),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse search response: {}", e)))?;

        Ok(search.into_videos())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchResponse {
    fn into_videos(self) -> Vec<VideoItem> {
        self.items
            .into_iter()
            // Channel/playlist hits have no videoId
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(VideoItem {
                    embed_url: format!("https://www.youtube.com/embed/{}", video_id),
                    video_id,
                    title: item.snippet.title,
                    thumbnail_url: item.snippet.thumbnails.and_then(|t| t.medium).map(|t| t.url),
                })
            })
            .take(MAX_VIDEOS as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_joins_goals_then_workouts() {
        let profile = UserProfile {
            uid: "u".to_string(),
            fitness_goals: vec!["Lose Weight".to_string()],
            preferred_workouts: vec!["Running".to_string(), "Yoga".to_string()],
            ..Default::default()
        };

        assert_eq!(
            build_search_query(&profile),
            "Lose Weight OR Running OR Yoga workout"
        );
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "items": [
                {"id": {"videoId": "abc"}, "snippet": {"title": "Leg day",
                    "thumbnails": {"medium": {"url": "https://i.ytimg.com/abc.jpg"}}}},
                {"id": {"channelId": "xyz"}, "snippet": {"title": "A channel"}}
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let videos = response.into_videos();

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "abc");
        assert_eq!(videos[0].embed_url, "https://www.youtube.com/embed/abc");
        assert_eq!(
            videos[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/abc.jpg")
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_upstream_error() {
        let service = VideoService::new(None);
        let err = service.recommend(&UserProfile::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}

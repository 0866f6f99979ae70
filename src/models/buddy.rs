// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Buddy requests, chat rooms, and chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Notification kind. Only buddy requests exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BuddyRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A buddy request delivered to the recipient's notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BuddyRequest {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub status: RequestStatus,
    /// Creation time, bumped on every status change
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_room_id: Option<String>,
}

impl BuddyRequest {
    /// New pending request with a fresh ID.
    pub fn new_pending(
        sender_id: &str,
        sender_username: &str,
        recipient_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            sender_id: sender_id.to_string(),
            sender_username: sender_username.to_string(),
            recipient_id: recipient_id.to_string(),
            kind: NotificationType::BuddyRequest,
            status: RequestStatus::Pending,
            timestamp: now,
            chat_room_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Chat room created when a buddy request is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatRoom {
    pub id: String,
    pub participants: BTreeMap<String, bool>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn between(user1: &str, user2: &str, now: DateTime<Utc>) -> Self {
        let participants = [(user1.to_string(), true), (user2.to_string(), true)]
            .into_iter()
            .collect();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            participants,
            created_at: now,
        }
    }

    pub fn has_participant(&self, uid: &str) -> bool {
        self.participants.get(uid).copied().unwrap_or(false)
    }

    /// The other participant, from `uid`'s point of view.
    pub fn partner_of(&self, uid: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|(id, &active)| active && id.as_str() != uid)
            .map(|(id, _)| id.as_str())
    }
}

/// A message in a chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatMessage {
    pub id: String,
    pub chat_room_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub text: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_type_field() {
        let request = BuddyRequest::new_pending("a", "ana", "b", Utc::now());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["type"], "buddy_request");
        assert_eq!(json["status"], "pending");
        assert!(json.get("chat_room_id").is_none());
    }

    #[test]
    fn test_chat_room_partner() {
        let room = ChatRoom::between("a", "b", Utc::now());

        assert!(room.has_participant("a"));
        assert!(!room.has_participant("c"));
        assert_eq!(room.partner_of("a"), Some("b"));
        assert_eq!(room.partner_of("b"), Some("a"));
    }
}

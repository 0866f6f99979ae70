// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Buddy matching, buddy requests, notifications, and chat.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{BuddyRequest, ChatMessage, ChatRoom, PublicProfile, RequestStatus, UserProfile};
use crate::routes::profile::require_profile;
use crate::services::realtime::{chat_topic, notifications_topic, RealtimeEvent, Subscription};
use crate::services::BuddyMatcher;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted chat message, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/buddies", get(list_buddies))
        .route("/api/buddies/matches", get(get_matches))
        .route("/api/buddies/requests", post(send_request))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/events", get(notification_events))
        .route("/api/notifications/{id}/accept", post(accept_request))
        .route("/api/notifications/{id}/reject", post(reject_request))
        .route(
            "/api/chats/{room_id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/chats/{room_id}/events", get(chat_events))
}

/// Turn a subscription into an SSE stream. The subscription is dropped
/// when the client disconnects.
fn event_stream(subscription: Subscription) -> impl Stream<Item = std::result::Result<Event, axum::Error>> {
    stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        let name = match &event {
            RealtimeEvent::Message(_) => "message",
            RealtimeEvent::Notification(_) => "notification",
        };
        Some((Event::default().event(name).json_data(&event), subscription))
    })
}

// ─── Matching ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MatchEntry {
    pub profile: PublicProfile,
    pub score: u32,
    /// Whether a request went to this user earlier in the session
    pub request_sent: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MatchesResponse {
    pub matches: Vec<MatchEntry>,
}

/// Best buddy candidates for the caller.
async fn get_matches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MatchesResponse>> {
    let profiles = state.db.list_users().await?;
    let ranked = BuddyMatcher::rank(&user.uid, &profiles)?;
    let session = state.sessions.snapshot(&user.session_id);

    let matches = ranked
        .into_iter()
        .map(|m| MatchEntry {
            request_sent: session.has_sent_request(&m.profile.uid),
            profile: PublicProfile::from(&m.profile),
            score: m.score,
        })
        .collect();

    Ok(Json(MatchesResponse { matches }))
}

// ─── Buddy Requests ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendRequestBody {
    pub recipient_id: String,
}

/// Send a buddy request. Each recipient can be asked once per session.
async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SendRequestBody>,
) -> Result<(StatusCode, Json<BuddyRequest>)> {
    let recipient_id = body.recipient_id.trim();
    if recipient_id.is_empty() {
        return Err(AppError::BadRequest("recipient_id is required".to_string()));
    }
    if recipient_id == user.uid {
        return Err(AppError::BadRequest(
            "Cannot send a buddy request to yourself".to_string(),
        ));
    }

    let sender = require_profile(&state, &user.uid).await?;
    let sender_username = sender
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            AppError::ProfileIncomplete("Set a username before sending requests".to_string())
        })?
        .to_string();

    if state.db.get_user(recipient_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", recipient_id)));
    }

    // Reserve before writing so concurrent sends in one session can't both pass.
    // The reservation is released if the write fails.
    let reservation = state
        .sessions
        .reserve_sent_request(&user.session_id, user.expires_at, recipient_id)
        .ok_or_else(|| {
            AppError::Conflict(format!("Buddy request to {} already sent", recipient_id))
        })?;

    let request = BuddyRequest::new_pending(&user.uid, &sender_username, recipient_id, Utc::now());
    state.db.set_buddy_request(&request).await?;
    reservation.commit();

    state.realtime.publish(
        &notifications_topic(recipient_id),
        RealtimeEvent::Notification(request.clone()),
    );
    tracing::info!(
        uid = %user.uid,
        recipient_id,
        request_id = %request.id,
        "Buddy request sent"
    );

    Ok((StatusCode::CREATED, Json(request)))
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NotificationsResponse {
    pub notifications: Vec<BuddyRequest>,
}

/// Pending requests addressed to the caller, newest first.
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<NotificationsResponse>> {
    let mut notifications: Vec<BuddyRequest> = state
        .db
        .list_buddy_requests_for(&user.uid)
        .await?
        .into_iter()
        .filter(BuddyRequest::is_pending)
        .collect();
    notifications.reverse();

    Ok(Json(NotificationsResponse { notifications }))
}

/// Load a request the caller may act on: addressed to them and still pending.
async fn load_actionable_request(state: &AppState, uid: &str, id: &str) -> Result<BuddyRequest> {
    let request = state
        .db
        .get_buddy_request(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Buddy request {} not found", id)))?;

    if request.recipient_id != uid {
        return Err(AppError::Forbidden(
            "Only the recipient can respond to a buddy request".to_string(),
        ));
    }
    if !request.is_pending() {
        return Err(AppError::Conflict(format!(
            "Buddy request {} was already answered",
            id
        )));
    }
    Ok(request)
}

/// Accept a request: opens a chat room between the two users.
async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<BuddyRequest>> {
    let mut request = load_actionable_request(&state, &user.uid, &id).await?;

    let now = Utc::now();
    let room = ChatRoom::between(&request.sender_id, &request.recipient_id, now);
    request.status = RequestStatus::Accepted;
    request.chat_room_id = Some(room.id.clone());
    request.timestamp = now;

    state.db.accept_buddy_request(&request, &room).await?;

    state.realtime.publish(
        &notifications_topic(&request.sender_id),
        RealtimeEvent::Notification(request.clone()),
    );

    Ok(Json(request))
}

async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<BuddyRequest>> {
    let mut request = load_actionable_request(&state, &user.uid, &id).await?;

    request.status = RequestStatus::Rejected;
    request.timestamp = Utc::now();
    state.db.set_buddy_request(&request).await?;

    tracing::info!(uid = %user.uid, request_id = %id, "Buddy request rejected");
    Ok(Json(request))
}

/// Live feed of new and answered requests for the caller.
async fn notification_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let subscription = state.realtime.subscribe(notifications_topic(&user.uid));
    Sse::new(event_stream(subscription)).keep_alive(KeepAlive::default())
}

// ─── Buddies & Chat ──────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BuddyEntry {
    pub chat_room_id: String,
    pub partner: PublicProfile,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BuddiesResponse {
    pub buddies: Vec<BuddyEntry>,
}

/// The caller's chat rooms, each with the other participant.
async fn list_buddies(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BuddiesResponse>> {
    let profile = state.db.get_user(&user.uid).await?.unwrap_or_default();

    let mut buddies = Vec::new();
    for room_id in profile.chats.iter().filter(|(_, &on)| on).map(|(id, _)| id) {
        let Some(room) = state.db.get_chat_room(room_id).await? else {
            tracing::warn!(uid = %user.uid, chat_room_id = %room_id, "Linked chat room missing");
            continue;
        };
        let Some(partner_id) = room.partner_of(&user.uid) else {
            continue;
        };

        let partner = state.db.get_user(partner_id).await?.unwrap_or_else(|| UserProfile {
            uid: partner_id.to_string(),
            ..Default::default()
        });
        buddies.push(BuddyEntry {
            chat_room_id: room.id.clone(),
            partner: PublicProfile::from(&partner),
        });
    }

    Ok(Json(BuddiesResponse { buddies }))
}

/// Load a chat room the caller participates in.
async fn load_room(state: &AppState, uid: &str, room_id: &str) -> Result<ChatRoom> {
    let room = state
        .db
        .get_chat_room(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat room {} not found", room_id)))?;

    if !room.has_participant(uid) {
        return Err(AppError::Forbidden(
            "Not a participant in this chat".to_string(),
        ));
    }
    Ok(room)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
}

/// Chat history, oldest first.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<Json<MessagesResponse>> {
    let room = load_room(&state, &user.uid, &room_id).await?;
    let messages = state.db.list_messages(&room.id).await?;

    Ok(Json(MessagesResponse { messages }))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub text: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message is longer than {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let room = load_room(&state, &user.uid, &room_id).await?;
    let sender = state.db.get_user(&user.uid).await?.unwrap_or_default();

    let message = ChatMessage {
        id: uuid::Uuid::new_v4().simple().to_string(),
        chat_room_id: room.id.clone(),
        sender_id: user.uid.clone(),
        sender_username: sender.display_name().to_string(),
        text: text.to_string(),
        timestamp: Utc::now(),
    };
    state.db.add_message(&message).await?;

    let delivered = state
        .realtime
        .publish(&chat_topic(&room.id), RealtimeEvent::Message(message.clone()));
    tracing::debug!(chat_room_id = %room.id, delivered, "Chat message sent");

    Ok((StatusCode::CREATED, Json(message)))
}

/// Live feed of new messages in a chat room.
async fn chat_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let room = load_room(&state, &user.uid, &room_id).await?;
    let subscription = state.realtime.subscribe(chat_topic(&room.id));

    Ok(Sse::new(event_stream(subscription)).keep_alive(KeepAlive::default()))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process change notifications for chat rooms and notification feeds.
//!
//! Writers publish after a successful store write. Readers hold a
//! [`Subscription`]; dropping it releases the listener, and the topic's
//! channel is removed with its last listener.

use crate::models::{BuddyRequest, ChatMessage};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events buffered per topic before slow listeners start skipping.
const CHANNEL_CAPACITY: usize = 64;

/// A change pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    Message(ChatMessage),
    Notification(BuddyRequest),
}

/// Topic for a chat room's messages.
pub fn chat_topic(chat_room_id: &str) -> String {
    format!("chat:{}", chat_room_id)
}

/// Topic for a user's notification feed.
pub fn notifications_topic(uid: &str) -> String {
    format!("notifications:{}", uid)
}

type Channels = DashMap<String, broadcast::Sender<RealtimeEvent>>;

/// Fan-out hub keyed by topic.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    channels: Arc<Channels>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening on `topic`.
    pub fn subscribe(&self, topic: impl Into<String>) -> Subscription {
        let topic = topic.into();
        let receiver = self
            .channels
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        tracing::debug!(topic = %topic, "Realtime subscription opened");

        Subscription {
            topic,
            receiver: Some(receiver),
            channels: self.channels.clone(),
        }
    }

    /// Deliver `event` to current listeners of `topic`. Returns how many received it.
    pub fn publish(&self, topic: &str, event: RealtimeEvent) -> usize {
        match self.channels.get(topic) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of live listeners on `topic`.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.channels
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of topics with at least one listener.
    pub fn topic_count(&self) -> usize {
        self.channels.len()
    }
}

/// A live listener. Released on drop.
pub struct Subscription {
    topic: String,
    /// Only `None` while dropping
    receiver: Option<broadcast::Receiver<RealtimeEvent>>,
    channels: Arc<Channels>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next event. Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "Realtime listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release our receiver first so concurrent drops agree on the count.
        drop(self.receiver.take());
        self.channels
            .remove_if(&self.topic, |_, sender| sender.receiver_count() == 0);
        tracing::debug!(topic = %self.topic, "Realtime subscription released");
    }
}

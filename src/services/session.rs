// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-session UI state that is deliberately not persisted.
//!
//! A session lives as long as one identity token. Logging out drops it, so
//! a new session may send buddy requests again and sees the profile prompt
//! again. Sessions whose token has expired are swept whenever a new session
//! starts.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// State scoped to one authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    sent_requests: HashSet<String>,
    profile_prompt_dismissed: bool,
}

impl SessionState {
    pub fn has_sent_request(&self, recipient_id: &str) -> bool {
        self.sent_requests.contains(recipient_id)
    }

    /// Record a request to `recipient_id`. Returns `false` if one was already sent.
    pub fn record_sent_request(&mut self, recipient_id: &str) -> bool {
        self.sent_requests.insert(recipient_id.to_string())
    }

    /// Undo a reservation after the send failed.
    pub fn forget_sent_request(&mut self, recipient_id: &str) {
        self.sent_requests.remove(recipient_id);
    }

    pub fn dismiss_profile_prompt(&mut self) {
        self.profile_prompt_dismissed = true;
    }

    pub fn profile_prompt_dismissed(&self) -> bool {
        self.profile_prompt_dismissed
    }
}

#[derive(Debug)]
struct Entry {
    state: SessionState,
    expires_at: DateTime<Utc>,
}

/// All live sessions, keyed by session ID.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with mutable access to a session, creating it if needed.
    ///
    /// `expires_at` is the expiry of the token that identifies the session.
    pub fn with_session<R>(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> R {
        if !self.sessions.contains_key(session_id) {
            self.purge_expired(Utc::now());
        }

        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Entry {
                state: SessionState::default(),
                expires_at,
            });
        entry.expires_at = entry.expires_at.max(expires_at);
        f(&mut entry.state)
    }

    /// Copy of a session's state (default if it doesn't exist yet).
    pub fn snapshot(&self, session_id: &str) -> SessionState {
        self.sessions
            .get(session_id)
            .map(|e| e.state.clone())
            .unwrap_or_default()
    }

    /// Reserve a buddy request to `recipient_id` for this session.
    ///
    /// Returns `None` if the session already sent one. The reservation is
    /// released when the guard drops unless [`SentRequestReservation::commit`]
    /// was called.
    pub fn reserve_sent_request(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
        recipient_id: &str,
    ) -> Option<SentRequestReservation<'_>> {
        self.with_session(session_id, expires_at, |s| s.record_sent_request(recipient_id))
            .then(|| SentRequestReservation {
                store: self,
                session_id: session_id.to_string(),
                recipient_id: recipient_id.to_string(),
                committed: false,
            })
    }

    /// Drop a session's state.
    pub fn end(&self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            tracing::debug!(session_id, "Session state dropped");
        }
    }

    /// Drop every session whose token expired at or before `now`.
    /// Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, e| e.expires_at > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, "Expired sessions purged");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// A pending sent-request entry. Released on drop unless committed.
pub struct SentRequestReservation<'a> {
    store: &'a SessionStore,
    session_id: String,
    recipient_id: String,
    committed: bool,
}

impl SentRequestReservation<'_> {
    /// Keep the entry; the request was stored.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for SentRequestReservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(mut entry) = self.store.sessions.get_mut(&self.session_id) {
            entry.state.forget_sent_request(&self.recipient_id);
        }
        tracing::debug!(
            session_id = %self.session_id,
            recipient_id = %self.recipient_id,
            "Sent-request reservation released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn later() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[test]
    fn test_sent_request_is_recorded_once() {
        let store = SessionStore::new();

        store
            .reserve_sent_request("s1", later(), "bob")
            .unwrap()
            .commit();
        assert!(store.reserve_sent_request("s1", later(), "bob").is_none());
        assert!(store.snapshot("s1").has_sent_request("bob"));

        // Other sessions are independent
        assert!(!store.snapshot("s2").has_sent_request("bob"));
    }

    #[test]
    fn test_uncommitted_reservation_is_released() {
        let store = SessionStore::new();

        let reservation = store.reserve_sent_request("s1", later(), "bob").unwrap();
        // A second send in the same session waits on the first
        assert!(store.reserve_sent_request("s1", later(), "bob").is_none());
        drop(reservation);

        assert!(!store.snapshot("s1").has_sent_request("bob"));
        assert!(store.reserve_sent_request("s1", later(), "bob").is_some());
    }

    #[test]
    fn test_end_session_forgets_state() {
        let store = SessionStore::new();
        store.with_session("s1", later(), |s| {
            s.record_sent_request("bob");
            s.dismiss_profile_prompt();
        });

        store.end("s1");

        let state = store.snapshot("s1");
        assert!(!state.has_sent_request("bob"));
        assert!(!state.profile_prompt_dismissed());
    }

    #[test]
    fn test_expired_sessions_swept_when_new_session_starts() {
        let store = SessionStore::new();
        store.with_session("live", later(), |s| s.dismiss_profile_prompt());
        store.with_session("old", Utc::now() - Duration::seconds(1), |s| {
            s.dismiss_profile_prompt()
        });
        assert_eq!(store.len(), 2);

        store.with_session("new", later(), |_| ());

        assert_eq!(store.len(), 2);
        assert!(!store.snapshot("old").profile_prompt_dismissed());
        assert!(store.snapshot("live").profile_prompt_dismissed());
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new();
        let now = Utc::now();
        store.with_session("live", now + Duration::minutes(5), |_| ());
        store.with_session("stale", now - Duration::minutes(5), |_| ());

        assert_eq!(store.purge_expired(now), 1);
        assert_eq!(store.purge_expired(now), 0);
        assert!(!store.is_empty());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod challenge;
pub mod matcher;
pub mod realtime;
pub mod session;
pub mod videos;

pub use challenge::ChallengeTracker;
pub use matcher::{BuddyMatch, BuddyMatcher};
pub use realtime::{RealtimeEvent, RealtimeHub, Subscription};
pub use session::{SessionState, SessionStore};
pub use videos::VideoService;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod buddy;
pub mod challenge;
pub mod user;
pub mod workout;

pub use buddy::{BuddyRequest, ChatMessage, ChatRoom, RequestStatus};
pub use challenge::{ChallengeDefinition, ChallengeStatus, GoalType, JoinedChallenge};
pub use user::{PublicProfile, UserProfile};
pub use workout::{Workout, WorkoutInput};

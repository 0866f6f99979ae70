// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitBuddy: backend for a fitness-social app
//!
//! Profiles, buddy matching and messaging, workout logging, and
//! time-boxed fitness challenges, stored in Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{RealtimeHub, SessionStore, VideoService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub sessions: SessionStore,
    pub realtime: RealtimeHub,
    pub video_service: VideoService,
}

impl AppState {
    /// Assemble state from config and a connected database.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let video_service = VideoService::new(config.youtube_api_key.clone());
        Self {
            config,
            db,
            sessions: SessionStore::new(),
            realtime: RealtimeHub::new(),
            video_service,
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles and chat-room links)
//! - Challenges (catalog and per-user participation)
//! - Buddy requests, chat rooms and messages
//! - Workouts
//!
//! Every write replaces the whole document (last writer wins). The only
//! multi-document write, accepting a buddy request, runs in a transaction.
//!
//! Besides the real Firestore client there is an in-memory backend with the
//! same semantics, used by tests and for local development.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    BuddyRequest, ChallengeDefinition, ChatMessage, ChatRoom, JoinedChallenge, UserProfile,
    Workout,
};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

type MemoryStore = DashMap<String, BTreeMap<String, serde_json::Value>>;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    Offline,
}

/// One document write inside a transaction.
struct PendingWrite {
    collection: &'static str,
    id: String,
    doc: serde_json::Value,
}

impl PendingWrite {
    fn new<T: Serialize>(collection: &'static str, id: &str, doc: &T) -> Result<Self, AppError> {
        Ok(Self {
            collection,
            id: id.to_string(),
            doc: serde_json::to_value(doc).map_err(db_err)?,
        })
    }
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token; hand it an unsigned one.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore Emulator");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a process-local store. Data is lost when the process exits.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── Generic Document Access ─────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj::<T>()
                .one(id)
                .await
                .map_err(db_err),
            Backend::Memory(store) => store
                .get(collection)
                .and_then(|docs| docs.get(id).cloned())
                .map(serde_json::from_value)
                .transpose()
                .map_err(db_err),
            Backend::Offline => Err(Self::offline()),
        }
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
            Backend::Memory(store) => {
                let value = serde_json::to_value(doc).map_err(db_err)?;
                store
                    .entry(collection.to_string())
                    .or_default()
                    .insert(id.to_string(), value);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
            Backend::Memory(store) => {
                if let Some(mut docs) = store.get_mut(collection) {
                    docs.remove(id);
                }
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// All documents in a collection, in document-ID order.
    async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .obj::<T>()
                .query()
                .await
                .map_err(db_err),
            Backend::Memory(store) => store
                .get(collection)
                .map(|docs| {
                    docs.values()
                        .cloned()
                        .map(serde_json::from_value)
                        .collect::<Result<Vec<T>, _>>()
                })
                .unwrap_or_else(|| Ok(Vec::new()))
                .map_err(db_err),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Documents whose string `field` equals `value`, in document-ID order.
    async fn list_docs_where<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let value = value.to_string();
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
                    .obj::<T>()
                    .query()
                    .await
                    .map_err(db_err)
            }
            Backend::Memory(store) => store
                .get(collection)
                .map(|docs| {
                    docs.values()
                        .filter(|doc| doc.get(field).and_then(|v| v.as_str()) == Some(value))
                        .cloned()
                        .map(serde_json::from_value)
                        .collect::<Result<Vec<T>, _>>()
                })
                .unwrap_or_else(|| Ok(Vec::new()))
                .map_err(db_err),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Apply several document writes together.
    async fn commit_writes(&self, writes: Vec<PendingWrite>) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                for write in &writes {
                    client
                        .fluent()
                        .update()
                        .in_col(write.collection)
                        .document_id(&write.id)
                        .object(&write.doc)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add {} write to transaction: {}",
                                write.collection, e
                            ))
                        })?;
                }

                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
                Ok(())
            }
            Backend::Memory(store) => {
                for write in writes {
                    store
                        .entry(write.collection.to_string())
                        .or_default()
                        .insert(write.id, write.doc);
                }
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by ID.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    /// Create or replace a user profile.
    pub async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.uid, user).await
    }

    /// All user profiles, in ID order.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        self.list_docs(collections::USERS).await
    }

    // ─── Challenge Catalog ───────────────────────────────────────

    /// All valid challenge definitions. Invalid entries are skipped.
    pub async fn list_challenges(&self) -> Result<Vec<ChallengeDefinition>, AppError> {
        let challenges: Vec<ChallengeDefinition> = self.list_docs(collections::CHALLENGES).await?;

        Ok(challenges
            .into_iter()
            .filter(|c| match c.validate() {
                Ok(()) => true,
                Err(reason) => {
                    tracing::warn!(challenge_id = %c.id, %reason, "Skipping invalid challenge");
                    false
                }
            })
            .collect())
    }

    /// Get one challenge definition. Invalid definitions read as missing.
    pub async fn get_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<Option<ChallengeDefinition>, AppError> {
        let challenge: Option<ChallengeDefinition> =
            self.get_doc(collections::CHALLENGES, challenge_id).await?;

        Ok(challenge.filter(|c| match c.validate() {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!(challenge_id, %reason, "Ignoring invalid challenge");
                false
            }
        }))
    }

    /// Write `catalog` if the challenge collection is empty.
    ///
    /// Returns the number of challenges written.
    pub async fn ensure_challenge_catalog(
        &self,
        catalog: &[ChallengeDefinition],
    ) -> Result<usize, AppError> {
        let existing: Vec<ChallengeDefinition> = self.list_docs(collections::CHALLENGES).await?;
        if !existing.is_empty() {
            tracing::debug!(count = existing.len(), "Challenge catalog already present");
            return Ok(0);
        }

        let writes = catalog
            .iter()
            .map(|c| PendingWrite::new(collections::CHALLENGES, &c.id, c))
            .collect::<Result<Vec<_>, _>>()?;
        self.commit_writes(writes).await?;

        tracing::info!(count = catalog.len(), "Seeded default challenge catalog");
        Ok(catalog.len())
    }

    // ─── Challenge Participation ─────────────────────────────────

    pub async fn get_joined_challenge(
        &self,
        uid: &str,
        challenge_id: &str,
    ) -> Result<Option<JoinedChallenge>, AppError> {
        let record: Option<JoinedChallenge> = self
            .get_doc(
                collections::JOINED_CHALLENGES,
                &JoinedChallenge::doc_id(uid, challenge_id),
            )
            .await?;

        Ok(record.filter(|r| {
            let owned = r.belongs_to(uid, challenge_id);
            if !owned {
                tracing::warn!(
                    uid,
                    challenge_id,
                    stored_uid = %r.user_id,
                    stored_challenge_id = %r.challenge_id,
                    "Ignoring participation record stored under another owner"
                );
            }
            owned
        }))
    }

    /// Store a participation record, replacing any previous one for the pair.
    pub async fn set_joined_challenge(&self, record: &JoinedChallenge) -> Result<(), AppError> {
        self.set_doc(
            collections::JOINED_CHALLENGES,
            &JoinedChallenge::doc_id(&record.user_id, &record.challenge_id),
            record,
        )
        .await
    }

    pub async fn list_joined_challenges(&self, uid: &str) -> Result<Vec<JoinedChallenge>, AppError> {
        self.list_docs_where(collections::JOINED_CHALLENGES, "user_id", uid)
            .await
    }

    // ─── Buddy Requests & Chat ───────────────────────────────────

    pub async fn get_buddy_request(&self, id: &str) -> Result<Option<BuddyRequest>, AppError> {
        self.get_doc(collections::BUDDY_REQUESTS, id).await
    }

    pub async fn set_buddy_request(&self, request: &BuddyRequest) -> Result<(), AppError> {
        self.set_doc(collections::BUDDY_REQUESTS, &request.id, request)
            .await
    }

    /// All requests addressed to `recipient_id`, oldest first.
    pub async fn list_buddy_requests_for(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<BuddyRequest>, AppError> {
        let mut requests: Vec<BuddyRequest> = self
            .list_docs_where(collections::BUDDY_REQUESTS, "recipient_id", recipient_id)
            .await?;
        requests.sort_by_key(|r| r.timestamp);
        Ok(requests)
    }

    /// Atomically accept a request: store the chat room, link it into both
    /// participants' profiles, and store the updated request.
    pub async fn accept_buddy_request(
        &self,
        request: &BuddyRequest,
        room: &ChatRoom,
    ) -> Result<(), AppError> {
        let mut writes = vec![PendingWrite::new(collections::CHAT_ROOMS, &room.id, room)?];

        for uid in room.participants.keys() {
            let mut profile = self.get_user(uid).await?.unwrap_or_else(|| {
                tracing::warn!(uid = %uid, "Linking chat room into missing profile");
                UserProfile {
                    uid: uid.clone(),
                    ..Default::default()
                }
            });
            profile.chats.insert(room.id.clone(), true);
            writes.push(PendingWrite::new(collections::USERS, uid, &profile)?);
        }

        writes.push(PendingWrite::new(
            collections::BUDDY_REQUESTS,
            &request.id,
            request,
        )?);

        self.commit_writes(writes).await?;

        tracing::info!(
            request_id = %request.id,
            chat_room_id = %room.id,
            "Buddy request accepted"
        );
        Ok(())
    }

    pub async fn get_chat_room(&self, id: &str) -> Result<Option<ChatRoom>, AppError> {
        self.get_doc(collections::CHAT_ROOMS, id).await
    }

    pub async fn add_message(&self, message: &ChatMessage) -> Result<(), AppError> {
        self.set_doc(collections::MESSAGES, &message.id, message)
            .await
    }

    /// Messages in a chat room, oldest first.
    pub async fn list_messages(&self, chat_room_id: &str) -> Result<Vec<ChatMessage>, AppError> {
        let mut messages: Vec<ChatMessage> = self
            .list_docs_where(collections::MESSAGES, "chat_room_id", chat_room_id)
            .await?;
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// A user's workouts, in the order they were logged.
    pub async fn list_workouts(&self, uid: &str) -> Result<Vec<Workout>, AppError> {
        let mut workouts: Vec<Workout> = self
            .list_docs_where(collections::WORKOUTS, "user_id", uid)
            .await?;
        workouts.sort_by_key(|w| w.logged_at);
        Ok(workouts)
    }

    pub async fn get_workout(&self, id: &str) -> Result<Option<Workout>, AppError> {
        self.get_doc(collections::WORKOUTS, id).await
    }

    pub async fn set_workout(&self, workout: &Workout) -> Result<(), AppError> {
        self.set_doc(collections::WORKOUTS, &workout.id, workout)
            .await
    }

    pub async fn delete_workout(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::WORKOUTS, id).await
    }
}

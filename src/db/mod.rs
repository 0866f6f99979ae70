//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHALLENGES: &str = "challenges";
    /// Per-user challenge participation (keyed by `{uid}_{challenge_id}`)
    pub const JOINED_CHALLENGES: &str = "joined_challenges";
    pub const BUDDY_REQUESTS: &str = "buddy_requests";
    pub const CHAT_ROOMS: &str = "chat_rooms";
    pub const MESSAGES: &str = "messages";
    pub const WORKOUTS: &str = "workouts";
}

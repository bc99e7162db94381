//! Storage layer: trait definitions plus Firestore and in-memory backends.

pub mod firestore;
pub mod memory;
pub mod store;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use store::{ActivityCursor, ActivityStore, EventLogStore, UserDirectory};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COHORTS: &str = "cohorts";
    pub const WEIGHT_SAMPLES: &str = "weight_samples";
    pub const WORKOUT_LOGS: &str = "workout_logs";
    /// Activity feed records (achievements, rankings, workouts)
    pub const ACTIVITIES: &str = "activities";
}

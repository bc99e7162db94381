//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque user ID (also used as document ID)
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Cohort this user competes in
    pub cohort: String,
    /// Self-reported starting weight in kg, if provided at signup
    pub initial_weight: Option<f64>,
    /// Current bodyweight in kg, used for bodyweight exercises
    pub bodyweight: Option<f64>,
    /// Whether the user has opted out of public leaderboard details
    #[serde(default)]
    pub is_private: bool,
    /// When the user registered (ISO 8601)
    pub created_at: String,
}

/// A cohort that users compete in.
///
/// Stored as its own document so unknown cohort names in queries can be
/// rejected instead of silently returning an empty leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cohort {
    /// Cohort name (also used as document ID, URL-encoded)
    pub name: String,
}

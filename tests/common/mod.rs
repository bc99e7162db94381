// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use fitrank::config::Config;
use fitrank::db::{ActivityStore, EventLogStore, MemoryStore, UserDirectory};
use fitrank::models::{CompletedWorkout, UserProfile, WeightSample};
use fitrank::routes::create_router;
use fitrank::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test store against the Firestore emulator.
#[allow(dead_code)]
pub async fn test_store() -> fitrank::db::FirestoreStore {
    fitrank::db::FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Shared state over a fresh in-memory store.
#[allow(dead_code)]
pub fn test_state() -> Arc<AppState> {
    let store = Arc::new(MemoryStore::new());
    let activities: Arc<dyn ActivityStore> = store.clone();
    let events: Arc<dyn EventLogStore> = store.clone();
    let users: Arc<dyn UserDirectory> = store;

    Arc::new(AppState::new(
        Config::test_default(),
        activities,
        events,
        users,
    ))
}

/// Create a test app over an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state();
    (create_router(state.clone()), state)
}

/// Bearer auth header value for a test user.
#[allow(dead_code)]
pub fn auth_header(state: &AppState, user_id: &str) -> String {
    let token = fitrank::middleware::auth::create_jwt(user_id, &state.config.jwt_signing_key)
        .expect("Failed to sign test JWT");
    format!("Bearer {}", token)
}

/// Parse a JSON response body.
#[allow(dead_code)]
pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Response body was not JSON")
}

/// Register a user in the given cohort.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, user_id: &str, cohort: &str) {
    seed_user_full(state, user_id, cohort, None, None).await;
}

/// Register a user with scoring-relevant profile attributes.
#[allow(dead_code)]
pub async fn seed_user_full(
    state: &AppState,
    user_id: &str,
    cohort: &str,
    initial_weight: Option<f64>,
    bodyweight: Option<f64>,
) {
    let profile = UserProfile {
        user_id: user_id.to_string(),
        name: format!("Test {}", user_id),
        email: Some(format!("{}@example.com", user_id)),
        cohort: cohort.to_string(),
        initial_weight,
        bodyweight,
        is_private: false,
        created_at: "2026-01-01T00:00:00Z".to_string(),
    };
    state
        .users
        .upsert_user(&profile)
        .await
        .expect("Failed to seed user");
}

/// Append a weigh-in to the event log.
#[allow(dead_code)]
pub async fn seed_weight(state: &AppState, user_id: &str, weight: f64, recorded_at: &str) {
    let sample = WeightSample {
        user_id: user_id.to_string(),
        weight,
        recorded_at: recorded_at.to_string(),
    };
    state
        .events
        .append_weight_sample(&sample)
        .await
        .expect("Failed to seed weight sample");
}

/// Append a completed workout to the event log.
#[allow(dead_code)]
pub async fn seed_workout(
    state: &AppState,
    user_id: &str,
    category: &str,
    weight: f64,
    sets: u32,
    reps: u32,
    completed_at: &str,
) {
    let workout = CompletedWorkout {
        user_id: user_id.to_string(),
        workout_id: format!("wk-{}-{}", user_id, completed_at),
        exercise: "Bench Press".to_string(),
        category: category.to_string(),
        weight,
        sets,
        reps,
        completed_at: completed_at.to_string(),
    };
    state
        .events
        .append_completed_workout(&workout)
        .await
        .expect("Failed to seed workout");
}

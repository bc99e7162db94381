// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event log routes: weigh-ins and completed workouts.
//!
//! These are thin append shims over the event log. Recording a workout
//! also publishes the corresponding feed record, so the feed and the
//! scoring inputs stay in step.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{AchievementKey, ActivityType, CompletedWorkout, WeightSample};
use crate::routes::activity::ActivityView;
use crate::services::scoring::BODYWEIGHT_CATEGORY;
use crate::services::NewActivity;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Json, State},
    routing::post,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Event log routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events/weight", post(record_weight))
        .route("/api/events/workouts", post(record_workout))
}

/// Parse an optional RFC3339 instant, defaulting to now.
fn parse_instant(raw: Option<&str>, field: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    match raw {
        None => Ok(chrono::Utc::now()),
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|_| {
                AppError::InvalidArgument(format!(
                    "Invalid '{}': must be an RFC3339 datetime",
                    field
                ))
            }),
    }
}

// ─── Weigh-ins ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct WeightSampleRequest {
    /// Body weight in kg
    #[validate(range(min = 1.0, max = 1000.0))]
    weight: f64,
    /// When the weigh-in happened; defaults to now
    recorded_at: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeightSampleResponse {
    pub message: String,
    pub weight: f64,
    pub recorded_at: String,
}

/// Record a weigh-in for the calling user.
async fn record_weight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<WeightSampleRequest>,
) -> Result<Json<WeightSampleResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    let recorded_at = format_utc_rfc3339(parse_instant(
        payload.recorded_at.as_deref(),
        "recorded_at",
    )?);

    let sample = WeightSample {
        user_id: user.user_id.clone(),
        weight: payload.weight,
        recorded_at: recorded_at.clone(),
    };
    state.events.append_weight_sample(&sample).await?;

    tracing::debug!(
        user_id = %user.user_id,
        weight = payload.weight,
        "Recorded weigh-in"
    );

    Ok(Json(WeightSampleResponse {
        message: "Weight recorded".to_string(),
        weight: payload.weight,
        recorded_at,
    }))
}

// ─── Completed workouts ──────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CompletedWorkoutRequest {
    #[validate(length(min = 1, max = 80))]
    workout_id: String,
    #[validate(length(min = 1, max = 80))]
    exercise: String,
    /// Workout category label (e.g. "Dumbbell", "Bodyweight")
    #[validate(length(min = 1, max = 40))]
    category: String,
    /// Weight used in kg; 0 for bodyweight exercises
    #[validate(range(min = 0.0, max = 1000.0))]
    weight: f64,
    #[validate(range(min = 1, max = 100))]
    sets: u32,
    #[validate(range(min = 1, max = 1000))]
    reps: u32,
    /// When the workout was completed; defaults to now
    completed_at: Option<String>,
}

/// Record a completed workout and publish its feed record.
///
/// The completion instant is part of the achievement key, so repeating
/// a workout on another day produces a new feed record while a retried
/// request for the same completion does not.
async fn record_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CompletedWorkoutRequest>,
) -> Result<Json<ActivityView>> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    let completed_at = parse_instant(payload.completed_at.as_deref(), "completed_at")?;

    let workout = CompletedWorkout {
        user_id: user.user_id.clone(),
        workout_id: payload.workout_id,
        exercise: payload.exercise,
        category: payload.category,
        weight: payload.weight,
        sets: payload.sets,
        reps: payload.reps,
        completed_at: format_utc_rfc3339(completed_at),
    };
    state.events.append_completed_workout(&workout).await?;

    let weight_info = if workout.category == BODYWEIGHT_CATEGORY {
        String::new()
    } else {
        format!(" with {}kg", workout.weight)
    };

    let key = AchievementKey::workout(&workout.workout_id, completed_at);
    let record = state
        .reconciler
        .publish(
            &user.user_id,
            &key,
            NewActivity {
                activity_type: ActivityType::Workout,
                category: None,
                title: format!("Completed {} Workout", workout.category),
                description: format!(
                    "{}: {} sets × {} reps{}",
                    workout.exercise, workout.sets, workout.reps, weight_info
                ),
            },
        )
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        workout_id = %workout.workout_id,
        "Recorded completed workout"
    );

    Ok(Json(ActivityView::from(record)))
}

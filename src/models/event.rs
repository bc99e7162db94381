// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw fitness event logs: weigh-ins and completed workouts.
//!
//! These are append-only inputs to scoring. Scores are always derived
//! from these logs at read time, never stored.

use serde::{Deserialize, Serialize};

/// A single weigh-in event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSample {
    /// Owning user ID
    pub user_id: String,
    /// Measured weight in kg
    pub weight: f64,
    /// When the weigh-in happened (ISO 8601)
    pub recorded_at: String,
}

/// A completed workout event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedWorkout {
    /// Owning user ID
    pub user_id: String,
    /// Client-assigned workout ID (used in achievement keys)
    pub workout_id: String,
    /// Exercise name (e.g. "Bench Press")
    pub exercise: String,
    /// Exercise category (e.g. "Push", "Pull", "Bodyweight")
    pub category: String,
    /// Weight used in kg (0 for bodyweight exercises)
    pub weight: f64,
    /// Number of sets performed
    pub sets: u32,
    /// Repetitions per set
    pub reps: u32,
    /// When the workout was completed (ISO 8601)
    pub completed_at: String,
}

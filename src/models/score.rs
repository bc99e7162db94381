// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Score categories, computed scores, and rank summaries.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;
use crate::models::event::{CompletedWorkout, WeightSample};
use crate::time_utils::format_utc_rfc3339;

/// Leaderboard scoring category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreCategory {
    /// Weight lost since start, with weekly weigh-in bonus
    WeightLoss,
    /// Total lifted volume (weight x sets x reps)
    Strength,
    /// Workout count plus active-day bonus
    Consistency,
    /// Volume plus active-day bonus
    Hybrid,
}

impl ScoreCategory {
    /// All categories, in display order.
    pub const ALL: [ScoreCategory; 4] = [
        ScoreCategory::WeightLoss,
        ScoreCategory::Strength,
        ScoreCategory::Consistency,
        ScoreCategory::Hybrid,
    ];

    /// Wire token, as used in URLs and achievement keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::WeightLoss => "weightLoss",
            ScoreCategory::Strength => "strength",
            ScoreCategory::Consistency => "consistency",
            ScoreCategory::Hybrid => "hybrid",
        }
    }

    /// Human-readable name for titles and descriptions.
    pub fn display_name(&self) -> &'static str {
        match self {
            ScoreCategory::WeightLoss => "Weight Loss",
            ScoreCategory::Strength => "Strength",
            ScoreCategory::Consistency => "Consistency",
            ScoreCategory::Hybrid => "Hybrid",
        }
    }
}

impl Display for ScoreCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoreCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weightLoss" => Ok(ScoreCategory::WeightLoss),
            "strength" => Ok(ScoreCategory::Strength),
            "consistency" => Ok(ScoreCategory::Consistency),
            "hybrid" => Ok(ScoreCategory::Hybrid),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown category: {}",
                other
            ))),
        }
    }
}

/// Date range filter for scoring, inclusive on both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Whether an ISO 8601 timestamp falls inside this range.
    ///
    /// Stored timestamps are fixed-format, so this is a plain string
    /// comparison, the same one the Firestore range filters use.
    pub fn contains_timestamp(&self, at: &str) -> bool {
        if let Some(start) = self.start {
            if at < format_utc_rfc3339(start).as_str() {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > format_utc_rfc3339(end).as_str() {
                return false;
            }
        }
        true
    }
}

/// Everything needed to score one user in any category.
#[derive(Debug, Clone, Default)]
pub struct UserScoreInput {
    pub user_id: String,
    /// Cohort the user is ranked in
    pub cohort: String,
    /// Self-reported starting weight, if any
    pub initial_weight: Option<f64>,
    /// Current bodyweight, for bodyweight exercise volume
    pub bodyweight: Option<f64>,
    /// Weigh-in history, oldest first
    pub weight_samples: Vec<WeightSample>,
    /// Completed workout history
    pub workouts: Vec<CompletedWorkout>,
}

/// Category-specific score breakdown, shown alongside the score.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(untagged)]
pub enum ScoreMetrics {
    WeightLoss {
        starting_weight: f64,
        current_weight: f64,
        weight_lost: f64,
        /// Distinct days with a weigh-in this week
        weigh_in_days: u32,
        /// Weekly consistency bonus as a fraction (0.25 = +25%)
        bonus: f64,
    },
    Strength {
        workout_count: u32,
        total_volume: f64,
    },
    Consistency {
        total_workouts: u32,
        active_days: u32,
    },
    Hybrid {
        total_volume: f64,
        active_days: u32,
        total_workouts: u32,
    },
}

/// A user's computed score in one category.
#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub user_id: String,
    pub category: ScoreCategory,
    pub score: f64,
    pub metrics: ScoreMetrics,
}

/// A user's rank in one category.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RankSummary {
    /// 1-based rank, or 0 if the user has no score in this category
    pub rank: u32,
    /// Number of ranked users in the category
    pub total: u32,
}

/// A user's ranks across all categories.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserRanks {
    pub cohort: String,
    pub weight_loss: RankSummary,
    pub strength: RankSummary,
    pub consistency: RankSummary,
    pub hybrid: RankSummary,
}

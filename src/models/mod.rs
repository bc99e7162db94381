// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod event;
pub mod score;
pub mod user;

pub use activity::{AchievementKey, ActivityRecord, ActivityType, Comment, Reaction, ReactionKind};
pub use event::{CompletedWorkout, WeightSample};
pub use score::{
    DateRange, RankSummary, ScoreCategory, ScoreMetrics, ScoreResult, UserRanks, UserScoreInput,
};
pub use user::{Cohort, UserProfile};

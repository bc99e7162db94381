// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod leaderboard;
pub mod reconciler;
pub mod scoring;

pub use leaderboard::{LeaderboardEntry, LeaderboardService};
pub use reconciler::{AchievementReconciler, NewActivity, SweepReport};

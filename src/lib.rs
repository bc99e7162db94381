// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitRank: leaderboard scoring and achievement reconciliation for a
//! fitness-social backend.
//!
//! This crate scores users in four leaderboard categories from raw
//! weigh-in and workout logs, publishes rank and achievement records to
//! a social activity feed, and heals the duplicate records that
//! concurrent publishing inevitably produces.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::{ActivityStore, EventLogStore, UserDirectory};
use services::{AchievementReconciler, LeaderboardService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub activities: Arc<dyn ActivityStore>,
    pub events: Arc<dyn EventLogStore>,
    pub users: Arc<dyn UserDirectory>,
    pub reconciler: AchievementReconciler,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    /// Wire the service layer over one set of store backends.
    pub fn new(
        config: Config,
        activities: Arc<dyn ActivityStore>,
        events: Arc<dyn EventLogStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let reconciler = AchievementReconciler::new(activities.clone());
        let leaderboard =
            LeaderboardService::new(users.clone(), events.clone(), reconciler.clone());

        Self {
            config,
            activities,
            events,
            users,
            reconciler,
            leaderboard,
        }
    }
}

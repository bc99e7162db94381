// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard and rank lookup routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DateRange, ScoreCategory, ScoreMetrics, UserRanks};
use crate::time_utils::{end_of_day, start_of_day};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Leaderboard routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard/ranks", get(get_user_ranks))
        .route("/api/leaderboard/{category}", get(get_leaderboard))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    /// Cohort to rank; defaults to the caller's cohort
    cohort: Option<String>,
    /// Filter window start (YYYY-MM-DD)
    start_date: Option<String>,
    /// Filter window end (YYYY-MM-DD), inclusive
    end_date: Option<String>,
}

fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    raw.map(|raw| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::InvalidArgument(format!("Invalid '{}': must be YYYY-MM-DD", field))
        })
    })
    .transpose()
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub category: ScoreCategory,
    pub cohort: String,
    pub entries: Vec<LeaderboardEntryView>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntryView {
    /// 1-based position in the board
    pub rank: u32,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub cohort: String,
    pub is_private: bool,
    pub score: f64,
    pub metrics: ScoreMetrics,
}

/// Compute a category leaderboard and publish rank records for the
/// top finishers.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(category): Path<String>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let category: ScoreCategory = category.parse()?;

    let start = parse_date(params.start_date.as_deref(), "start_date")?.map(start_of_day);
    let end = parse_date(params.end_date.as_deref(), "end_date")?.map(end_of_day);
    let range = if start.is_some() || end.is_some() {
        Some(DateRange { start, end })
    } else {
        None
    };

    let cohort = match params.cohort {
        Some(cohort) => cohort,
        None => {
            let profile = state
                .users
                .get_user(&user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
            profile.cohort
        }
    };

    tracing::debug!(
        user_id = %user.user_id,
        category = %category,
        cohort = %cohort,
        start_date = ?params.start_date,
        end_date = ?params.end_date,
        "Building leaderboard"
    );

    let entries = state
        .leaderboard
        .build(category, &cohort, range.as_ref(), chrono::Utc::now())
        .await?;

    let entries = entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| LeaderboardEntryView {
            rank: idx as u32 + 1,
            user_id: entry.user_id,
            name: entry.name,
            email: entry.email,
            cohort: entry.cohort,
            is_private: entry.is_private,
            score: entry.score,
            metrics: entry.metrics,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        category,
        cohort,
        entries,
    }))
}

/// Get the calling user's rank in every category, within their cohort.
///
/// Read-only: no rank records are published from this path.
async fn get_user_ranks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserRanks>> {
    let ranks = state
        .leaderboard
        .user_ranks(&user.user_id, chrono::Utc::now())
        .await?;

    Ok(Json(ranks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_iso_dates() {
        let date = parse_date(Some("2026-08-19"), "start_date").unwrap().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 8, 19).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date(Some("19/08/2026"), "start_date").is_err());
        assert!(parse_date(Some("2026-8-19T00:00:00Z"), "start_date").is_err());
        assert_eq!(parse_date(None, "start_date").unwrap(), None);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard construction service.
//!
//! Builds category leaderboards on demand:
//! 1. List the cohort's members
//! 2. Load each member's event logs and compute their score
//! 3. Sort descending by score, excluding users with no events
//! 4. Publish top-3 rank facts through the reconciler
//!
//! Scores are never stored; every build recomputes from the logs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

use crate::db::{EventLogStore, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::{
    AchievementKey, ActivityType, DateRange, RankSummary, ScoreCategory, ScoreMetrics, UserRanks,
    UserScoreInput,
};
use crate::services::reconciler::{AchievementReconciler, NewActivity};
use crate::services::scoring::compute_score;

/// How many top entries earn a rank achievement.
const TOP_RANKS: usize = 3;

/// Concurrent event-log loads per leaderboard build.
const MAX_CONCURRENT_SCORE_LOADS: usize = 16;

/// One row of a computed leaderboard, ordered best to worst.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub cohort: String,
    pub is_private: bool,
    pub score: f64,
    pub metrics: ScoreMetrics,
}

/// First `n` entries of a leaderboard.
pub fn top_n(entries: &[LeaderboardEntry], n: usize) -> &[LeaderboardEntry] {
    &entries[..entries.len().min(n)]
}

/// Builds leaderboards and publishes rank achievements.
#[derive(Clone)]
pub struct LeaderboardService {
    users: Arc<dyn UserDirectory>,
    events: Arc<dyn EventLogStore>,
    reconciler: AchievementReconciler,
}

impl LeaderboardService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        events: Arc<dyn EventLogStore>,
        reconciler: AchievementReconciler,
    ) -> Self {
        Self {
            users,
            events,
            reconciler,
        }
    }

    /// Compute a category leaderboard without side effects.
    ///
    /// Users with no relevant events are excluded entirely. Ties keep
    /// the cohort listing order (user ID ascending), which the stable
    /// sort preserves.
    pub async fn compute(
        &self,
        category: ScoreCategory,
        cohort: &str,
        range: Option<&DateRange>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let members = self.users.list_cohort(cohort).await?;
        let member_count = members.len();

        let gathered: Vec<_> = stream::iter(members)
            .map(|user| {
                let events = Arc::clone(&self.events);
                async move {
                    // Weight loss always scores the full weigh-in
                    // history; the other categories only need workouts
                    // in the requested range.
                    let input = match category {
                        ScoreCategory::WeightLoss => {
                            let weight_samples = events.weight_samples(&user.user_id).await?;
                            UserScoreInput {
                                user_id: user.user_id.clone(),
                                cohort: user.cohort.clone(),
                                initial_weight: user.initial_weight,
                                bodyweight: user.bodyweight,
                                weight_samples,
                                workouts: Vec::new(),
                            }
                        }
                        _ => {
                            let workouts =
                                events.completed_workouts(&user.user_id, range).await?;
                            UserScoreInput {
                                user_id: user.user_id.clone(),
                                cohort: user.cohort.clone(),
                                initial_weight: user.initial_weight,
                                bodyweight: user.bodyweight,
                                weight_samples: Vec::new(),
                                workouts,
                            }
                        }
                    };
                    Ok::<_, AppError>((user, input))
                }
            })
            .buffered(MAX_CONCURRENT_SCORE_LOADS)
            .collect::<Vec<Result<_>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let mut entries = Vec::new();
        for (user, input) in gathered {
            if let Some(result) = compute_score(category, &input, range, now) {
                entries.push(LeaderboardEntry {
                    user_id: user.user_id,
                    name: user.name,
                    email: user.email,
                    cohort: user.cohort,
                    is_private: user.is_private,
                    score: result.score,
                    metrics: result.metrics,
                });
            }
        }

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!(
            category = category.as_str(),
            cohort,
            members = member_count,
            ranked = entries.len(),
            "Computed leaderboard"
        );

        Ok(entries)
    }

    /// Build a leaderboard and publish rank facts for the top 3.
    ///
    /// Rank facts are monotonic: falling out of the top 3 never
    /// retracts one. Publish failures are logged but do not fail the
    /// build, since the leaderboard itself is already computed.
    pub async fn build(
        &self,
        category: ScoreCategory,
        cohort: &str,
        range: Option<&DateRange>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let entries = self.compute(category, cohort, range, now).await?;

        for (idx, entry) in top_n(&entries, TOP_RANKS).iter().enumerate() {
            let rank = (idx + 1) as u32;
            let key = AchievementKey::rank(rank, category);
            let new = NewActivity {
                activity_type: ActivityType::Ranking,
                category: Some(category),
                title: format!("Achieved Rank {} {}", rank, rank_emoji(rank)),
                description: format!(
                    "Congratulations on achieving rank {} in the {} leaderboard for cohort {}!",
                    rank,
                    category.display_name(),
                    cohort
                ),
            };

            if let Err(e) = self.reconciler.publish(&entry.user_id, &key, new).await {
                tracing::warn!(
                    user_id = %entry.user_id,
                    category = category.as_str(),
                    rank,
                    error = %e,
                    "Failed to publish rank achievement"
                );
            }
        }

        Ok(entries)
    }

    /// A user's current rank in every category, without publishing.
    pub async fn user_ranks(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserRanks> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let weight_loss = self
            .rank_in(ScoreCategory::WeightLoss, &user.cohort, user_id, now)
            .await?;
        let strength = self
            .rank_in(ScoreCategory::Strength, &user.cohort, user_id, now)
            .await?;
        let consistency = self
            .rank_in(ScoreCategory::Consistency, &user.cohort, user_id, now)
            .await?;
        let hybrid = self
            .rank_in(ScoreCategory::Hybrid, &user.cohort, user_id, now)
            .await?;

        Ok(UserRanks {
            cohort: user.cohort,
            weight_loss,
            strength,
            consistency,
            hybrid,
        })
    }

    async fn rank_in(
        &self,
        category: ScoreCategory,
        cohort: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RankSummary> {
        let entries = self.compute(category, cohort, None, now).await?;
        let total = entries.len() as u32;
        let rank = entries
            .iter()
            .position(|e| e.user_id == user_id)
            .map(|idx| (idx + 1) as u32)
            .unwrap_or(0);

        Ok(RankSummary { rank, total })
    }
}

/// Emoji attached to a rank achievement title.
fn rank_emoji(rank: u32) -> &'static str {
    match rank {
        1 => "👑",
        2 => "🥈",
        3 => "🥉",
        _ => "🏅",
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity feed records: achievements, rank announcements, workouts.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::score::ScoreCategory;

/// A record in a user's activity feed.
///
/// Achievement and ranking records are "fact-bearing": they announce a
/// real-world fact identified by `achievement_key`, and the system
/// guarantees at most one surviving record per (user, key) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Record ID (also used as document ID)
    pub id: Uuid,
    /// Owning user ID
    pub user_id: String,
    /// What kind of record this is
    pub activity_type: ActivityType,
    /// Identity of the underlying fact, for fact-bearing records
    pub achievement_key: Option<AchievementKey>,
    /// Leaderboard category, for rank announcements
    pub category: Option<ScoreCategory>,
    /// Display title
    pub title: String,
    /// Display description
    pub description: String,
    /// Reactions left by other users
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// Comments left by other users
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// When this record was created (ISO 8601)
    pub created_at: String,
}

impl ActivityRecord {
    /// Total engagement on this record.
    ///
    /// Used to pick the survivor when duplicate records are merged: the
    /// record with the most engagement wins.
    pub fn engagement(&self) -> usize {
        self.reactions.len() + self.comments.len()
    }
}

/// Kind of activity feed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    /// A one-off achievement (e.g. completing a workout milestone)
    Achievement,
    /// A leaderboard rank announcement
    Ranking,
    /// A plain workout log entry
    Workout,
}

impl ActivityType {
    /// Whether records of this type announce an underlying fact and are
    /// therefore subject to duplicate reconciliation.
    pub fn is_fact_bearing(&self) -> bool {
        matches!(self, ActivityType::Achievement | ActivityType::Ranking)
    }
}

/// Stable identity of the fact behind a fact-bearing record.
///
/// Two records with the same owner and the same key announce the same
/// fact and are duplicates of each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementKey(String);

impl AchievementKey {
    /// Key for achieving a leaderboard rank in a category.
    pub fn rank(rank: u32, category: ScoreCategory) -> Self {
        Self(format!("rank-{}-{}", rank, category.as_str()))
    }

    /// Key for completing a workout.
    ///
    /// The completion time is part of the identity: completing the same
    /// workout again on another day is a new fact.
    pub fn workout(workout_id: &str, completed_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self(format!(
            "workout-complete-{}-{}",
            workout_id,
            completed_at.timestamp_millis()
        ))
    }

    /// Parse a key from its string form (e.g. from an API request).
    pub fn parse(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A reaction left on an activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// User who reacted
    pub user_id: String,
    /// Which reaction
    pub kind: ReactionKind,
    /// When the reaction was left (ISO 8601)
    pub created_at: String,
}

/// Supported reaction emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    #[serde(rename = "❤️")]
    Heart,
    #[serde(rename = "🔥")]
    Fire,
    #[serde(rename = "💪")]
    Muscle,
    #[serde(rename = "👏")]
    Clap,
}

impl ReactionKind {
    pub fn emoji(&self) -> &'static str {
        match self {
            ReactionKind::Heart => "❤️",
            ReactionKind::Fire => "🔥",
            ReactionKind::Muscle => "💪",
            ReactionKind::Clap => "👏",
        }
    }
}

impl Display for ReactionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.emoji())
    }
}

impl FromStr for ReactionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "❤️" => Ok(ReactionKind::Heart),
            "🔥" => Ok(ReactionKind::Fire),
            "💪" => Ok(ReactionKind::Muscle),
            "👏" => Ok(ReactionKind::Clap),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid reaction type: {}",
                other
            ))),
        }
    }
}

/// A comment left on an activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID (for deletion)
    pub id: Uuid,
    /// User who commented
    pub user_id: String,
    /// Comment text (trimmed, at most 200 characters)
    pub text: String,
    /// When the comment was left (ISO 8601)
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rank_key_format() {
        let key = AchievementKey::rank(1, ScoreCategory::WeightLoss);
        assert_eq!(key.as_str(), "rank-1-weightLoss");

        let key = AchievementKey::rank(3, ScoreCategory::Hybrid);
        assert_eq!(key.as_str(), "rank-3-hybrid");
    }

    #[test]
    fn test_workout_key_includes_millis() {
        let at = chrono::Utc
            .with_ymd_and_hms(2026, 8, 19, 10, 30, 0)
            .unwrap();
        let key = AchievementKey::workout("push-day-1", at);
        assert_eq!(
            key.as_str(),
            format!("workout-complete-push-day-1-{}", at.timestamp_millis())
        );
    }

    #[test]
    fn test_same_workout_different_day_is_different_key() {
        let monday = chrono::Utc.with_ymd_and_hms(2026, 8, 17, 9, 0, 0).unwrap();
        let friday = chrono::Utc.with_ymd_and_hms(2026, 8, 21, 9, 0, 0).unwrap();

        assert_ne!(
            AchievementKey::workout("push-day-1", monday),
            AchievementKey::workout("push-day-1", friday)
        );
    }

    #[test]
    fn test_reaction_kind_round_trip() {
        for emoji in ["❤️", "🔥", "💪", "👏"] {
            let kind: ReactionKind = emoji.parse().unwrap();
            assert_eq!(kind.emoji(), emoji);
        }
    }

    #[test]
    fn test_reaction_kind_rejects_unknown() {
        assert!("🎉".parse::<ReactionKind>().is_err());
        assert!("heart".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn test_fact_bearing_types() {
        assert!(ActivityType::Achievement.is_fact_bearing());
        assert!(ActivityType::Ranking.is_fact_bearing());
        assert!(!ActivityType::Workout.is_fact_bearing());
    }

    #[test]
    fn test_activity_type_serde_lowercase() {
        let json = serde_json::to_string(&ActivityType::Ranking).unwrap();
        assert_eq!(json, "\"ranking\"");
    }
}

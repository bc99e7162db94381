// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Score computation for all leaderboard categories.
//!
//! Scores are pure functions of the event logs: nothing here reads or
//! writes storage, and recomputing a score never changes the inputs.
//! A user with no relevant events has no score at all, which is
//! different from a score of zero.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{
    CompletedWorkout, DateRange, ScoreCategory, ScoreMetrics, ScoreResult, UserScoreInput,
    WeightSample,
};
use crate::time_utils::{format_utc_rfc3339, start_of_week};

/// Workout category whose volume uses the user's bodyweight.
pub const BODYWEIGHT_CATEGORY: &str = "Bodyweight";

/// Score bonus per distinct active day, for consistency and hybrid.
const ACTIVE_DAY_BONUS: f64 = 10.0;

/// Weekly weigh-in bonus tiers: (minimum distinct days, bonus fraction).
const WEEKLY_BONUS_TIERS: [(u32, f64); 3] = [(5, 0.5), (3, 0.25), (1, 0.1)];

/// Compute a user's score in one category.
///
/// Returns `None` when the user has no relevant events, so callers can
/// exclude them from the leaderboard instead of ranking them at zero.
/// `range` restricts which workouts count; weight loss always uses the
/// full weigh-in history. `now` anchors the current week for the
/// weigh-in bonus.
pub fn compute_score(
    category: ScoreCategory,
    input: &UserScoreInput,
    range: Option<&DateRange>,
    now: DateTime<Utc>,
) -> Option<ScoreResult> {
    let (score, metrics) = match category {
        ScoreCategory::WeightLoss => weight_loss_score(input, now)?,
        ScoreCategory::Strength => strength_score(input, range)?,
        ScoreCategory::Consistency => consistency_score(input, range)?,
        ScoreCategory::Hybrid => hybrid_score(input, range)?,
    };

    Some(ScoreResult {
        user_id: input.user_id.clone(),
        category,
        score,
        metrics,
    })
}

// ─── Weight Loss ─────────────────────────────────────────────

fn weight_loss_score(input: &UserScoreInput, now: DateTime<Utc>) -> Option<(f64, ScoreMetrics)> {
    if input.weight_samples.is_empty() {
        return None;
    }

    // Timestamps are fixed-format ISO 8601, so string order is
    // chronological. Ties keep insertion order: min_by returns the
    // first minimum, max_by the last maximum.
    let oldest = input
        .weight_samples
        .iter()
        .min_by(|a, b| a.recorded_at.cmp(&b.recorded_at))?;
    let newest = input
        .weight_samples
        .iter()
        .max_by(|a, b| a.recorded_at.cmp(&b.recorded_at))?;

    let starting_weight = input.initial_weight.unwrap_or(oldest.weight);
    let current_weight = newest.weight;
    let weight_lost = starting_weight - current_weight;

    let weigh_in_days = weigh_in_days_this_week(&input.weight_samples, now);
    let bonus = weekly_bonus(weigh_in_days);
    let score = weight_lost * (1.0 + bonus);

    Some((
        score,
        ScoreMetrics::WeightLoss {
            starting_weight,
            current_weight,
            weight_lost,
            weigh_in_days,
            bonus,
        },
    ))
}

/// Count distinct calendar days with a weigh-in since the start of the
/// current week (Sunday 00:00 UTC).
fn weigh_in_days_this_week(samples: &[WeightSample], now: DateTime<Utc>) -> u32 {
    let week_start = format_utc_rfc3339(start_of_week(now));

    let days: HashSet<&str> = samples
        .iter()
        .filter(|s| s.recorded_at.as_str() >= week_start.as_str())
        .filter_map(|s| extract_day_key(&s.recorded_at))
        .collect();

    days.len() as u32
}

fn weekly_bonus(weigh_in_days: u32) -> f64 {
    for (min_days, bonus) in WEEKLY_BONUS_TIERS {
        if weigh_in_days >= min_days {
            return bonus;
        }
    }
    0.0
}

// ─── Strength ────────────────────────────────────────────────

fn strength_score(
    input: &UserScoreInput,
    range: Option<&DateRange>,
) -> Option<(f64, ScoreMetrics)> {
    let workouts = workouts_in_range(&input.workouts, range);
    if workouts.is_empty() {
        return None;
    }

    let total_volume: f64 = workouts
        .iter()
        .map(|w| effective_weight(w, input.bodyweight) * f64::from(w.sets) * f64::from(w.reps))
        .sum();

    Some((
        total_volume,
        ScoreMetrics::Strength {
            workout_count: workouts.len() as u32,
            total_volume,
        },
    ))
}

/// Weight used for volume: bodyweight exercises use the user's current
/// bodyweight, or 0 if they never recorded one.
fn effective_weight(workout: &CompletedWorkout, bodyweight: Option<f64>) -> f64 {
    if workout.category == BODYWEIGHT_CATEGORY {
        bodyweight.unwrap_or(0.0)
    } else {
        workout.weight
    }
}

// ─── Consistency ─────────────────────────────────────────────

fn consistency_score(
    input: &UserScoreInput,
    range: Option<&DateRange>,
) -> Option<(f64, ScoreMetrics)> {
    let workouts = workouts_in_range(&input.workouts, range);
    if workouts.is_empty() {
        return None;
    }

    let total_workouts = workouts.len() as u32;
    let active_days = active_days(&workouts);
    let score = f64::from(total_workouts) + f64::from(active_days) * ACTIVE_DAY_BONUS;

    Some((
        score,
        ScoreMetrics::Consistency {
            total_workouts,
            active_days,
        },
    ))
}

// ─── Hybrid ──────────────────────────────────────────────────

/// Hybrid combines raw volume with active days. Unlike strength, no
/// bodyweight substitution is applied: bodyweight workouts count for
/// their active days but contribute no volume.
fn hybrid_score(input: &UserScoreInput, range: Option<&DateRange>) -> Option<(f64, ScoreMetrics)> {
    let workouts = workouts_in_range(&input.workouts, range);
    if workouts.is_empty() {
        return None;
    }

    let total_volume: f64 = workouts
        .iter()
        .map(|w| w.weight * f64::from(w.sets) * f64::from(w.reps))
        .sum();
    let active_days = active_days(&workouts);
    let score = total_volume + f64::from(active_days) * ACTIVE_DAY_BONUS;

    Some((
        score,
        ScoreMetrics::Hybrid {
            total_volume,
            active_days,
            total_workouts: workouts.len() as u32,
        },
    ))
}

// ─── Shared Helpers ──────────────────────────────────────────

fn workouts_in_range<'a>(
    workouts: &'a [CompletedWorkout],
    range: Option<&DateRange>,
) -> Vec<&'a CompletedWorkout> {
    workouts
        .iter()
        .filter(|w| range.map_or(true, |r| r.contains_timestamp(&w.completed_at)))
        .collect()
}

/// Count distinct calendar days with at least one workout.
fn active_days(workouts: &[&CompletedWorkout]) -> u32 {
    let days: HashSet<&str> = workouts
        .iter()
        .filter_map(|w| extract_day_key(&w.completed_at))
        .collect();
    days.len() as u32
}

/// Extract "YYYY-MM-DD" from an ISO 8601 date string.
fn extract_day_key(date: &str) -> Option<&str> {
    if date.len() >= 10 {
        Some(&date[..10])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2026-08-19 is a Wednesday; the week started Sunday 2026-08-16.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 19, 12, 0, 0).unwrap()
    }

    fn sample(recorded_at: &str, weight: f64) -> WeightSample {
        WeightSample {
            user_id: "u1".to_string(),
            weight,
            recorded_at: recorded_at.to_string(),
        }
    }

    fn workout(completed_at: &str, category: &str, weight: f64, sets: u32, reps: u32) -> CompletedWorkout {
        CompletedWorkout {
            user_id: "u1".to_string(),
            workout_id: "w1".to_string(),
            exercise: "Test".to_string(),
            category: category.to_string(),
            weight,
            sets,
            reps,
            completed_at: completed_at.to_string(),
        }
    }

    #[test]
    fn test_no_events_means_no_score() {
        let input = UserScoreInput::default();
        for category in ScoreCategory::ALL {
            assert!(compute_score(category, &input, None, now()).is_none());
        }
    }

    #[test]
    fn test_weight_loss_with_weekly_bonus() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            weight_samples: vec![
                sample("2026-07-01T08:00:00Z", 80.0),
                // Three distinct days this week: bonus tier 25%
                sample("2026-08-16T08:00:00Z", 77.0),
                sample("2026-08-17T08:00:00Z", 76.0),
                sample("2026-08-18T08:00:00Z", 75.0),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::WeightLoss, &input, None, now()).unwrap();

        // 5kg lost with a 25% bonus
        assert_eq!(result.score, 6.25);
        match result.metrics {
            ScoreMetrics::WeightLoss {
                starting_weight,
                current_weight,
                weight_lost,
                weigh_in_days,
                bonus,
            } => {
                assert_eq!(starting_weight, 80.0);
                assert_eq!(current_weight, 75.0);
                assert_eq!(weight_lost, 5.0);
                assert_eq!(weigh_in_days, 3);
                assert_eq!(bonus, 0.25);
            }
            other => panic!("Wrong metrics variant: {:?}", other),
        }
    }

    #[test]
    fn test_weight_loss_prefers_reported_starting_weight() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            initial_weight: Some(90.0),
            weight_samples: vec![
                sample("2026-07-01T08:00:00Z", 80.0),
                sample("2026-07-15T08:00:00Z", 78.0),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::WeightLoss, &input, None, now()).unwrap();

        // No weigh-ins this week, so no bonus
        assert_eq!(result.score, 12.0);
    }

    #[test]
    fn test_weigh_ins_same_day_count_once() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            weight_samples: vec![
                sample("2026-08-17T08:00:00Z", 76.0),
                sample("2026-08-17T20:00:00Z", 75.0),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::WeightLoss, &input, None, now()).unwrap();
        match result.metrics {
            ScoreMetrics::WeightLoss { weigh_in_days, bonus, .. } => {
                assert_eq!(weigh_in_days, 1);
                assert_eq!(bonus, 0.1);
            }
            other => panic!("Wrong metrics variant: {:?}", other),
        }
    }

    #[test]
    fn test_weekly_bonus_tiers() {
        assert_eq!(weekly_bonus(0), 0.0);
        assert_eq!(weekly_bonus(1), 0.1);
        assert_eq!(weekly_bonus(2), 0.1);
        assert_eq!(weekly_bonus(3), 0.25);
        assert_eq!(weekly_bonus(4), 0.25);
        assert_eq!(weekly_bonus(5), 0.5);
        assert_eq!(weekly_bonus(7), 0.5);
    }

    #[test]
    fn test_last_week_weigh_ins_earn_no_bonus() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            weight_samples: vec![
                // Saturday 2026-08-15, just before the week boundary
                sample("2026-08-15T23:59:59Z", 80.0),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::WeightLoss, &input, None, now()).unwrap();
        match result.metrics {
            ScoreMetrics::WeightLoss { weigh_in_days, .. } => assert_eq!(weigh_in_days, 0),
            other => panic!("Wrong metrics variant: {:?}", other),
        }
    }

    #[test]
    fn test_strength_volume_with_bodyweight_substitution() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            bodyweight: Some(80.0),
            workouts: vec![
                workout("2026-08-17T10:00:00Z", "Push", 100.0, 2, 5),
                workout("2026-08-18T10:00:00Z", BODYWEIGHT_CATEGORY, 0.0, 1, 5),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::Strength, &input, None, now()).unwrap();

        // 100*2*5 + 80*1*5
        assert_eq!(result.score, 1400.0);
        match result.metrics {
            ScoreMetrics::Strength {
                workout_count,
                total_volume,
            } => {
                assert_eq!(workout_count, 2);
                assert_eq!(total_volume, 1400.0);
            }
            other => panic!("Wrong metrics variant: {:?}", other),
        }
    }

    #[test]
    fn test_bodyweight_defaults_to_zero() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            bodyweight: None,
            workouts: vec![workout(
                "2026-08-17T10:00:00Z",
                BODYWEIGHT_CATEGORY,
                0.0,
                3,
                10,
            )],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::Strength, &input, None, now()).unwrap();
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_consistency_counts_workouts_and_days() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            workouts: vec![
                workout("2026-08-17T08:00:00Z", "Push", 50.0, 3, 10),
                workout("2026-08-17T18:00:00Z", "Pull", 50.0, 3, 10),
                workout("2026-08-18T08:00:00Z", "Legs", 80.0, 3, 10),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::Consistency, &input, None, now()).unwrap();

        // 3 workouts across 2 days
        assert_eq!(result.score, 23.0);
    }

    #[test]
    fn test_hybrid_skips_bodyweight_substitution() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            bodyweight: Some(80.0),
            workouts: vec![
                workout("2026-08-17T10:00:00Z", "Push", 100.0, 1, 10),
                workout("2026-08-18T10:00:00Z", BODYWEIGHT_CATEGORY, 0.0, 1, 10),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::Hybrid, &input, None, now()).unwrap();

        // 1000 volume (bodyweight workout contributes none) + 2 active days
        assert_eq!(result.score, 1020.0);
    }

    #[test]
    fn test_range_filters_workouts() {
        let range = DateRange {
            start: Some(Utc.with_ymd_and_hms(2026, 8, 18, 0, 0, 0).unwrap()),
            end: None,
        };
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            workouts: vec![
                workout("2026-08-10T10:00:00Z", "Push", 100.0, 1, 10),
                workout("2026-08-18T10:00:00Z", "Push", 50.0, 1, 10),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::Strength, &input, Some(&range), now()).unwrap();
        assert_eq!(result.score, 500.0);
    }

    #[test]
    fn test_all_workouts_out_of_range_means_no_score() {
        let range = DateRange {
            start: Some(Utc.with_ymd_and_hms(2026, 8, 18, 0, 0, 0).unwrap()),
            end: None,
        };
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            workouts: vec![workout("2026-08-10T10:00:00Z", "Push", 100.0, 1, 10)],
            ..Default::default()
        };

        assert!(compute_score(ScoreCategory::Strength, &input, Some(&range), now()).is_none());
        assert!(compute_score(ScoreCategory::Consistency, &input, Some(&range), now()).is_none());
        assert!(compute_score(ScoreCategory::Hybrid, &input, Some(&range), now()).is_none());
    }

    #[test]
    fn test_weight_loss_ignores_range() {
        let range = DateRange {
            start: Some(Utc.with_ymd_and_hms(2026, 8, 18, 0, 0, 0).unwrap()),
            end: None,
        };
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            weight_samples: vec![
                sample("2026-07-01T08:00:00Z", 80.0),
                sample("2026-07-15T08:00:00Z", 78.0),
            ],
            ..Default::default()
        };

        let result =
            compute_score(ScoreCategory::WeightLoss, &input, Some(&range), now()).unwrap();
        assert_eq!(result.score, 2.0);
    }

    #[test]
    fn test_weight_gain_scores_negative() {
        let input = UserScoreInput {
            user_id: "u1".to_string(),
            weight_samples: vec![
                sample("2026-07-01T08:00:00Z", 80.0),
                sample("2026-07-15T08:00:00Z", 83.0),
            ],
            ..Default::default()
        };

        let result = compute_score(ScoreCategory::WeightLoss, &input, None, now()).unwrap();
        assert_eq!(result.score, -3.0);
    }
}

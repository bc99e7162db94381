// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement reconciliation service.
//!
//! Guarantees at most one durable activity record per achievement fact:
//! 1. `publish` creates a record for a fact, returning any existing one
//! 2. `reconcile` collapses duplicates on the live path, keeping the
//!    record with the most engagement and merging the rest into it
//! 3. `sweep_user` collapses duplicates offline, keeping the oldest
//!    record per fact
//!
//! `publish` is check-then-create without a lock, so two concurrent
//! publishes of the same fact can both create a record. That is
//! accepted: every path that records engagement on a ranking activity
//! runs `reconcile` first, which heals the duplication before the
//! engagement lands.
//!
//! `reconcile` and `sweep_user` intentionally keep different records.
//! Reconcile runs while a user is interacting, so it preserves the
//! record people have already reacted to. Sweep is offline maintenance,
//! where the earliest record is the canonical one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::db::ActivityStore;
use crate::error::Result;
use crate::models::{AchievementKey, ActivityRecord, ActivityType, ReactionKind, ScoreCategory};
use crate::time_utils::format_utc_rfc3339;

/// Payload for publishing a new activity record.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub category: Option<ScoreCategory>,
    pub title: String,
    pub description: String,
}

/// Result of a duplicate sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    /// Records examined
    pub scanned: usize,
    /// Duplicate records deleted
    pub removed: usize,
}

/// Idempotency and dedup layer in front of the activity store.
#[derive(Clone)]
pub struct AchievementReconciler {
    activities: Arc<dyn ActivityStore>,
}

impl AchievementReconciler {
    pub fn new(activities: Arc<dyn ActivityStore>) -> Self {
        Self { activities }
    }

    /// Publish an activity record for a fact, idempotently.
    ///
    /// If a record for (user, key) already exists it is returned
    /// unchanged; the new title and description are discarded. With
    /// duplicates present, the oldest record is returned.
    pub async fn publish(
        &self,
        user_id: &str,
        key: &AchievementKey,
        new: NewActivity,
    ) -> Result<ActivityRecord> {
        let mut existing = self.activities.find_by_key(user_id, key).await?;
        existing.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(record) = existing.into_iter().next() {
            tracing::debug!(
                user_id,
                key = key.as_str(),
                "Fact already published, returning existing record"
            );
            return Ok(record);
        }

        let record = ActivityRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            activity_type: new.activity_type,
            achievement_key: Some(key.clone()),
            category: new.category,
            title: new.title,
            description: new.description,
            reactions: Vec::new(),
            comments: Vec::new(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        self.activities.create(&record).await?;

        tracing::info!(
            user_id,
            key = key.as_str(),
            id = %record.id,
            "Published activity record"
        );

        Ok(record)
    }

    /// Collapse duplicate records for one (user, key) pair.
    ///
    /// Keeps the record with the most engagement (ties: most recently
    /// created, then largest ID), merges everyone else's reactions and
    /// comments into it, and deletes the rest. Running this twice in a
    /// row is a no-op the second time.
    ///
    /// Returns the surviving record, or `None` if no record exists.
    pub async fn reconcile(
        &self,
        user_id: &str,
        key: &AchievementKey,
    ) -> Result<Option<ActivityRecord>> {
        let mut records = self.activities.find_by_key(user_id, key).await?;
        if records.len() <= 1 {
            return Ok(records.pop());
        }

        let mut survivor_idx = 0;
        for (idx, record) in records.iter().enumerate().skip(1) {
            if is_better_survivor(record, &records[survivor_idx]) {
                survivor_idx = idx;
            }
        }
        let mut survivor = records.swap_remove(survivor_idx);
        let duplicates = records;

        merge_engagement(&mut survivor, &duplicates);

        // Update the survivor before deleting duplicates: if we crash in
        // between, the merged engagement is already durable and a later
        // reconcile pass deletes the leftovers.
        self.activities.update(&survivor).await?;
        for duplicate in &duplicates {
            self.activities.delete(duplicate.id).await?;
        }

        tracing::info!(
            user_id,
            key = key.as_str(),
            survivor = %survivor.id,
            merged = duplicates.len(),
            "Reconciled duplicate activity records"
        );

        Ok(Some(survivor))
    }

    /// Remove duplicate fact-bearing records for one user, keeping the
    /// oldest record per achievement key.
    ///
    /// Unlike `reconcile`, engagement does not influence which record
    /// survives, and nothing is merged.
    pub async fn sweep_user(&self, user_id: &str) -> Result<SweepReport> {
        let records = self.activities.find_by_user(user_id).await?;
        let scanned = records.len();

        let mut groups: HashMap<&str, Vec<&ActivityRecord>> = HashMap::new();
        for record in &records {
            if !record.activity_type.is_fact_bearing() {
                continue;
            }
            if let Some(key) = &record.achievement_key {
                groups.entry(key.as_str()).or_default().push(record);
            }
        }

        let mut removed = 0;
        for (key, mut group) in groups {
            if group.len() <= 1 {
                continue;
            }

            // Oldest first; the head of the list survives.
            group.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });

            for duplicate in &group[1..] {
                self.activities.delete(duplicate.id).await?;
                removed += 1;
            }

            tracing::debug!(
                user_id,
                key,
                kept = %group[0].id,
                removed = group.len() - 1,
                "Swept duplicate records for key"
            );
        }

        if removed > 0 {
            tracing::info!(user_id, scanned, removed, "Duplicate sweep complete");
        }

        Ok(SweepReport { scanned, removed })
    }
}

/// Survivor order: engagement, then creation time, then ID.
fn is_better_survivor(candidate: &ActivityRecord, current: &ActivityRecord) -> bool {
    (candidate.engagement(), &candidate.created_at, candidate.id)
        > (current.engagement(), &current.created_at, current.id)
}

/// Merge reactions and comments from `duplicates` into `survivor`.
///
/// Reactions are deduplicated by (user, kind), comments by (user, text).
/// The merged lists are ordered by original creation time.
fn merge_engagement(survivor: &mut ActivityRecord, duplicates: &[ActivityRecord]) {
    let mut seen_reactions: HashSet<(String, ReactionKind)> = survivor
        .reactions
        .iter()
        .map(|r| (r.user_id.clone(), r.kind))
        .collect();
    let mut seen_comments: HashSet<(String, String)> = survivor
        .comments
        .iter()
        .map(|c| (c.user_id.clone(), c.text.clone()))
        .collect();

    for duplicate in duplicates {
        for reaction in &duplicate.reactions {
            if seen_reactions.insert((reaction.user_id.clone(), reaction.kind)) {
                survivor.reactions.push(reaction.clone());
            }
        }
        for comment in &duplicate.comments {
            if seen_comments.insert((comment.user_id.clone(), comment.text.clone())) {
                survivor.comments.push(comment.clone());
            }
        }
    }

    survivor
        .reactions
        .sort_by(|a, b| a.created_at.cmp(&b.created_at));
    survivor
        .comments
        .sort_by(|a, b| a.created_at.cmp(&b.created_at));
}

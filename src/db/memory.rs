// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory storage backend.
//!
//! Used for local development (`STORE_MODE=memory`) and for tests that
//! should not need a Firestore emulator. Data lives only as long as the
//! process.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    AchievementKey, ActivityRecord, Comment, CompletedWorkout, DateRange, Reaction, UserProfile,
    WeightSample,
};
use crate::time_utils::format_utc_rfc3339;

use crate::db::store::{ActivityCursor, ActivityStore, EventLogStore, UserDirectory};

/// In-memory store backed by concurrent maps.
///
/// `Clone` is cheap and shares the underlying maps, mirroring how the
/// Firestore client is shared.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, UserProfile>>,
    cohorts: Arc<DashSet<String>>,
    weight_samples: Arc<DashMap<String, Vec<WeightSample>>>,
    workouts: Arc<DashMap<String, Vec<CompletedWorkout>>>,
    activities: Arc<DashMap<Uuid, ActivityRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ─── Activity Feed Operations ────────────────────────────────

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn find_by_key(
        &self,
        user_id: &str,
        key: &AchievementKey,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        Ok(self
            .activities
            .iter()
            .filter(|entry| {
                let record = entry.value();
                record.user_id == user_id && record.achievement_key.as_ref() == Some(key)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<ActivityRecord>, AppError> {
        Ok(self
            .activities
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn list_page(
        &self,
        user_id: &str,
        cursor: Option<ActivityCursor>,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let mut records: Vec<ActivityRecord> = self
            .activities
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();

        if let Some(cursor) = cursor {
            let created_at = format_utc_rfc3339(cursor.created_at);
            // Keep records strictly after the cursor position, matching
            // the Firestore composite filter.
            records.retain(|r| {
                r.created_at < created_at || (r.created_at == created_at && r.id < cursor.id)
            });
        }

        // Newest first; same-second records ordered by ID descending.
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        records.truncate(limit as usize);

        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ActivityRecord>, AppError> {
        Ok(self.activities.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, record: &ActivityRecord) -> Result<(), AppError> {
        self.activities.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &ActivityRecord) -> Result<(), AppError> {
        self.activities.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.activities.remove(&id);
        Ok(())
    }

    async fn append_reaction(
        &self,
        id: Uuid,
        reaction: Reaction,
    ) -> Result<Option<ActivityRecord>, AppError> {
        // get_mut holds the shard lock, so the append is atomic.
        match self.activities.get_mut(&id) {
            Some(mut entry) => {
                entry.reactions.push(reaction);
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    async fn append_comment(
        &self,
        id: Uuid,
        comment: Comment,
    ) -> Result<Option<ActivityRecord>, AppError> {
        match self.activities.get_mut(&id) {
            Some(mut entry) => {
                entry.comments.push(comment);
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }
}

// ─── Event Log Operations ────────────────────────────────────

#[async_trait]
impl EventLogStore for MemoryStore {
    async fn weight_samples(&self, user_id: &str) -> Result<Vec<WeightSample>, AppError> {
        let mut samples = self
            .weight_samples
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        samples.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(samples)
    }

    async fn completed_workouts(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<CompletedWorkout>, AppError> {
        let mut workouts = self
            .workouts
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        if let Some(range) = range {
            workouts.retain(|w| range.contains_timestamp(&w.completed_at));
        }

        Ok(workouts)
    }

    async fn append_weight_sample(&self, sample: &WeightSample) -> Result<(), AppError> {
        self.weight_samples
            .entry(sample.user_id.clone())
            .or_default()
            .push(sample.clone());
        Ok(())
    }

    async fn append_completed_workout(&self, workout: &CompletedWorkout) -> Result<(), AppError> {
        self.workouts
            .entry(workout.user_id.clone())
            .or_default()
            .push(workout.clone());
        Ok(())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn list_cohort(&self, cohort: &str) -> Result<Vec<UserProfile>, AppError> {
        if !self.cohorts.contains(cohort) {
            return Err(AppError::InvalidArgument(format!(
                "Unknown cohort: {}",
                cohort
            )));
        }

        let mut members: Vec<UserProfile> = self
            .users
            .iter()
            .filter(|entry| entry.value().cohort == cohort)
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(members)
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let mut users: Vec<UserProfile> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(users)
    }

    async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        self.cohorts.insert(user.cohort.clone());
        self.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage trait definitions.
//!
//! Handlers and services depend on these traits rather than a concrete
//! backend, so the same code runs against Firestore in production and
//! the in-memory store in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AchievementKey, ActivityRecord, Comment, CompletedWorkout, DateRange, Reaction, UserProfile,
    WeightSample,
};

/// Pagination cursor for the activity feed.
///
/// Points at the last record of the previous page. The next page
/// contains records strictly older than this position.
#[derive(Debug, Clone, Copy)]
pub struct ActivityCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Storage for activity feed records.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// All records owned by `user_id` carrying exactly this achievement key.
    ///
    /// Normally returns zero or one record; more than one means
    /// duplicates exist and reconciliation is needed.
    async fn find_by_key(
        &self,
        user_id: &str,
        key: &AchievementKey,
    ) -> Result<Vec<ActivityRecord>>;

    /// All records owned by `user_id`, in no particular order.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<ActivityRecord>>;

    /// One page of `user_id`'s feed, newest first.
    async fn list_page(
        &self,
        user_id: &str,
        cursor: Option<ActivityCursor>,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>>;

    /// Fetch a single record by ID.
    async fn get(&self, id: Uuid) -> Result<Option<ActivityRecord>>;

    /// Insert a new record.
    async fn create(&self, record: &ActivityRecord) -> Result<()>;

    /// Overwrite an existing record.
    async fn update(&self, record: &ActivityRecord) -> Result<()>;

    /// Delete a record. Deleting a missing record is not an error.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Atomically append a reaction to a record.
    ///
    /// Returns the updated record, or `None` if the record no longer
    /// exists (e.g. it was merged away by reconciliation).
    async fn append_reaction(&self, id: Uuid, reaction: Reaction)
        -> Result<Option<ActivityRecord>>;

    /// Atomically append a comment to a record.
    ///
    /// Returns the updated record, or `None` if the record no longer
    /// exists.
    async fn append_comment(&self, id: Uuid, comment: Comment) -> Result<Option<ActivityRecord>>;
}

/// Storage for raw fitness event logs.
#[async_trait]
pub trait EventLogStore: Send + Sync {
    /// All weigh-ins for a user, oldest first.
    async fn weight_samples(&self, user_id: &str) -> Result<Vec<WeightSample>>;

    /// Completed workouts for a user, optionally restricted to a date range.
    async fn completed_workouts(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<CompletedWorkout>>;

    /// Record a weigh-in.
    async fn append_weight_sample(&self, sample: &WeightSample) -> Result<()>;

    /// Record a completed workout.
    async fn append_completed_workout(&self, workout: &CompletedWorkout) -> Result<()>;
}

/// Storage for user profiles and cohorts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user profile by ID.
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// All members of a cohort, ordered by user ID.
    ///
    /// Returns `InvalidArgument` for a cohort name that has never been
    /// registered, so typos do not masquerade as empty leaderboards.
    async fn list_cohort(&self, cohort: &str) -> Result<Vec<UserProfile>>;

    /// All registered users, ordered by user ID.
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    /// Create or update a user profile, registering its cohort.
    async fn upsert_user(&self, user: &UserProfile) -> Result<()>;
}

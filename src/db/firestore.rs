// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed storage.
//!
//! Implements the storage traits on top of Firestore:
//! - Users and cohorts (profile storage, cohort registry)
//! - Event logs (weigh-ins, completed workouts)
//! - Activity feed records (achievements, rankings, workouts)

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::collections;
use crate::db::store::{ActivityCursor, ActivityStore, EventLogStore, UserDirectory};
use crate::error::AppError;
use crate::models::{
    AchievementKey, ActivityRecord, Cohort, Comment, CompletedWorkout, DateRange, Reaction,
    UserProfile, WeightSample,
};
use crate::time_utils::format_utc_rfc3339;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::StoreUnavailable("Store not connected (offline mode)".to_string())
        })
    }
}

// ─── Activity Feed Operations ────────────────────────────────

#[async_trait]
impl ActivityStore for FirestoreStore {
    async fn find_by_key(
        &self,
        user_id: &str,
        key: &AchievementKey,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let user_id = user_id.to_string();
        let key = key.as_str().to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("achievement_key").eq(key.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<ActivityRecord>, AppError> {
        let user_id = user_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn list_page(
        &self,
        user_id: &str,
        cursor: Option<ActivityCursor>,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES);

        let query = if let Some(cursor) = cursor {
            let user_id = user_id.to_string();
            let created_at = format_utc_rfc3339(cursor.created_at);
            let id = cursor.id.to_string();
            // A record comes after the cursor if it is strictly older, or
            // was created in the same second but has a smaller ID.
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.for_any([
                        q.field("created_at").less_than(created_at.clone()),
                        q.for_all([
                            q.field("created_at").eq(created_at.clone()),
                            q.field("id").less_than(id.clone()),
                        ]),
                    ]),
                ])
            })
        } else {
            let user_id = user_id.to_string();
            query.filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
        };

        query
            .order_by([
                ("created_at", firestore::FirestoreQueryDirection::Descending),
                ("id", firestore::FirestoreQueryDirection::Descending),
            ])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<ActivityRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(id.to_string())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn create(&self, record: &ActivityRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(record.id.to_string())
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, record: &ActivityRecord) -> Result<(), AppError> {
        self.create(record).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACTIVITIES)
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn append_reaction(
        &self,
        id: Uuid,
        reaction: Reaction,
    ) -> Result<Option<ActivityRecord>, AppError> {
        let mut transaction = self.get_client()?.begin_transaction().await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to begin transaction: {}", e))
        })?;

        let current: Option<ActivityRecord> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(id.to_string())
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to read record in transaction: {}", e))
            })?;

        let mut record = match current {
            Some(record) => record,
            None => {
                let _ = transaction.rollback().await;
                return Ok(None);
            }
        };

        record.reactions.push(reaction);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(record.id.to_string())
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to add update to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Transaction commit failed: {}", e)))?;

        Ok(Some(record))
    }

    async fn append_comment(
        &self,
        id: Uuid,
        comment: Comment,
    ) -> Result<Option<ActivityRecord>, AppError> {
        let mut transaction = self.get_client()?.begin_transaction().await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to begin transaction: {}", e))
        })?;

        let current: Option<ActivityRecord> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(id.to_string())
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to read record in transaction: {}", e))
            })?;

        let mut record = match current {
            Some(record) => record,
            None => {
                let _ = transaction.rollback().await;
                return Ok(None);
            }
        };

        record.comments.push(comment);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(record.id.to_string())
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to add update to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Transaction commit failed: {}", e)))?;

        Ok(Some(record))
    }
}

// ─── Event Log Operations ────────────────────────────────────

#[async_trait]
impl EventLogStore for FirestoreStore {
    async fn weight_samples(&self, user_id: &str) -> Result<Vec<WeightSample>, AppError> {
        let user_id = user_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::WEIGHT_SAMPLES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([(
                "recorded_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn completed_workouts(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<CompletedWorkout>, AppError> {
        let user_id = user_id.to_string();
        let start = range.and_then(|r| r.start).map(format_utc_rfc3339);
        let end = range.and_then(|r| r.end).map(format_utc_rfc3339);

        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_LOGS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    start
                        .clone()
                        .and_then(|s| q.field("completed_at").greater_than_or_equal(s)),
                    end.clone()
                        .and_then(|e| q.field("completed_at").less_than_or_equal(e)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn append_weight_sample(&self, sample: &WeightSample) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WEIGHT_SAMPLES)
            .document_id(Uuid::new_v4().to_string())
            .object(sample)
            .execute()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn append_completed_workout(&self, workout: &CompletedWorkout) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_LOGS)
            .document_id(Uuid::new_v4().to_string())
            .object(workout)
            .execute()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserDirectory for FirestoreStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn list_cohort(&self, cohort: &str) -> Result<Vec<UserProfile>, AppError> {
        // Reject unknown cohorts up front. Cohort names are URL-encoded
        // to make safe document IDs (they may contain spaces).
        let registered: Option<Cohort> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COHORTS)
            .obj()
            .one(urlencoding::encode(cohort).as_ref())
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        if registered.is_none() {
            return Err(AppError::InvalidArgument(format!(
                "Unknown cohort: {}",
                cohort
            )));
        }

        let cohort = cohort.to_string();

        // Document IDs are user IDs, so the default __name__ order gives
        // a deterministic user ID ordering.
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("cohort").eq(cohort.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        // Register the cohort so leaderboard queries can validate it.
        let cohort = Cohort {
            name: user.cohort.clone(),
        };
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COHORTS)
            .document_id(urlencoding::encode(&user.cohort).as_ref())
            .object(&cohort)
            .execute()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }
}

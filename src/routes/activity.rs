// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity feed, publishing, and engagement routes.

use crate::db::ActivityCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AchievementKey, ActivityRecord, ActivityType, Comment, Reaction, ReactionKind, ScoreCategory,
};
use crate::services::NewActivity;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_COMMENT_CHARS: usize = 200;

/// Activity routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/activities",
            get(get_activities).post(publish_activity),
        )
        .route("/api/activities/cleanup", post(cleanup_duplicates))
        .route("/api/activities/{id}/reactions", post(toggle_reaction))
        .route("/api/activities/{id}/comments", post(add_comment))
        .route(
            "/api/activities/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
}

// ─── Response views ──────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityView {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub id: Uuid,
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub activity_type: ActivityType,
    pub achievement_key: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub category: Option<ScoreCategory>,
    pub title: String,
    pub description: String,
    pub reactions: Vec<ReactionView>,
    pub comments: Vec<CommentView>,
    pub created_at: String,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReactionView {
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub kind: ReactionKind,
    pub created_at: String,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentView {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub id: Uuid,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}

impl From<Reaction> for ReactionView {
    fn from(reaction: Reaction) -> Self {
        Self {
            user_id: reaction.user_id,
            kind: reaction.kind,
            created_at: reaction.created_at,
        }
    }
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            user_id: comment.user_id,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

impl From<ActivityRecord> for ActivityView {
    fn from(record: ActivityRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            activity_type: record.activity_type,
            achievement_key: record.achievement_key.map(|k| k.as_str().to_string()),
            category: record.category,
            title: record.title,
            description: record.description,
            reactions: record.reactions.into_iter().map(ReactionView::from).collect(),
            comments: record.comments.into_iter().map(CommentView::from).collect(),
            created_at: record.created_at,
        }
    }
}

// ─── Shared helpers ──────────────────────────────────────────

async fn fetch_record(state: &AppState, id: Uuid) -> Result<ActivityRecord> {
    state
        .activities
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
}

/// Reconcile duplicates before applying engagement to a ranking record.
///
/// The record the client addressed may be merged away by the
/// reconciliation, in which case the engagement goes to the survivor.
async fn reconcile_if_ranking(state: &AppState, record: ActivityRecord) -> Result<ActivityRecord> {
    if record.activity_type != ActivityType::Ranking {
        return Ok(record);
    }
    let key = match &record.achievement_key {
        Some(key) => key.clone(),
        None => return Ok(record),
    };

    match state.reconciler.reconcile(&record.user_id, &key).await? {
        Some(survivor) => Ok(survivor),
        // Raced with a concurrent delete; treat like any missing record.
        None => Err(AppError::NotFound(format!(
            "Activity {} not found",
            record.id
        ))),
    }
}

// ─── Feed ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;
const CURSOR_PARTS: usize = 3;

fn parse_cursor(cursor: Option<&str>) -> Result<Option<ActivityCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::InvalidArgument("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.split(':').collect();
            if parts.len() != CURSOR_PARTS {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            let id = parts[2].parse::<Uuid>().map_err(|_| invalid_cursor())?;
            let created_at =
                chrono::DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)?;

            Ok(ActivityCursor { created_at, id })
        })
        .transpose()
}

fn encode_cursor(cursor: ActivityCursor) -> String {
    let payload = format!(
        "{}:{}:{}",
        cursor.created_at.timestamp(),
        cursor.created_at.timestamp_subsec_nanos(),
        cursor.id
    );
    URL_SAFE_NO_PAD.encode(payload)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedResponse {
    pub activities: Vec<ActivityView>,
    pub next_cursor: Option<String>,
}

/// Get the calling user's activity feed, newest first.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let limit = params.per_page.min(MAX_PER_PAGE);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    tracing::debug!(
        user_id = %user.user_id,
        cursor = ?params.cursor,
        per_page = limit,
        "Fetching activity feed"
    );

    // Fetch one extra item to determine if another page is available.
    let fetch_limit = limit.saturating_add(1);
    let mut records = state
        .activities
        .list_page(&user.user_id, cursor, fetch_limit)
        .await?;

    let has_more = records.len() > limit as usize;
    if has_more {
        records.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        records.last().and_then(|record| {
            chrono::DateTime::parse_from_rfc3339(&record.created_at)
                .ok()
                .map(|dt| {
                    encode_cursor(ActivityCursor {
                        created_at: dt.with_timezone(&chrono::Utc),
                        id: record.id,
                    })
                })
        })
    } else {
        None
    };

    let activities = records.into_iter().map(ActivityView::from).collect();

    Ok(Json(FeedResponse {
        activities,
        next_cursor,
    }))
}

// ─── Publishing ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct PublishActivityRequest {
    /// Stable identity of the fact being announced.
    #[validate(length(min = 1, max = 120))]
    achievement_key: String,
    activity_type: ActivityType,
    category: Option<ScoreCategory>,
    #[validate(length(min = 1, max = 120))]
    title: String,
    #[validate(length(max = 500))]
    description: String,
}

/// Publish an activity record for a fact, idempotently.
///
/// If a record for the key already exists it is returned unchanged, so
/// a client retrying a badge unlock cannot create a duplicate.
async fn publish_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PublishActivityRequest>,
) -> Result<Json<ActivityView>> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    let key = AchievementKey::parse(&payload.achievement_key);
    let record = state
        .reconciler
        .publish(
            &user.user_id,
            &key,
            NewActivity {
                activity_type: payload.activity_type,
                category: payload.category,
                title: payload.title,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(ActivityView::from(record)))
}

// ─── Reactions ───────────────────────────────────────────────

#[derive(Deserialize)]
struct ReactionRequest {
    /// Reaction emoji, one of ❤️ 🔥 💪 👏
    kind: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReactionResponse {
    pub message: String,
    /// Reaction totals on the record, keyed by emoji
    pub reaction_counts: HashMap<String, u32>,
    /// Kinds the caller currently holds on the record
    #[cfg_attr(feature = "binding-generation", ts(type = "string[]"))]
    pub user_reactions: Vec<ReactionKind>,
}

/// Toggle the caller's reaction on an activity record.
///
/// A user holds at most one live reaction per record: sending the same
/// kind again removes it, sending a different kind replaces it.
async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReactionRequest>,
) -> Result<Json<ReactionResponse>> {
    let kind: ReactionKind = payload.kind.parse()?;

    let record = fetch_record(&state, id).await?;
    let mut record = reconcile_if_ranking(&state, record).await?;

    let existing_kind = record
        .reactions
        .iter()
        .find(|r| r.user_id == user.user_id)
        .map(|r| r.kind);

    let (message, record) = match existing_kind {
        None => {
            // First reaction from this user: plain per-record append.
            let reaction = Reaction {
                user_id: user.user_id.clone(),
                kind,
                created_at: format_utc_rfc3339(chrono::Utc::now()),
            };
            let updated = state
                .activities
                .append_reaction(record.id, reaction)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", record.id)))?;
            ("Reaction added", updated)
        }
        Some(existing) if existing == kind => {
            // Same kind again toggles the reaction off.
            record.reactions.retain(|r| r.user_id != user.user_id);
            state.activities.update(&record).await?;
            ("Reaction removed", record)
        }
        Some(_) => {
            // A different kind replaces the previous reaction.
            record.reactions.retain(|r| r.user_id != user.user_id);
            record.reactions.push(Reaction {
                user_id: user.user_id.clone(),
                kind,
                created_at: format_utc_rfc3339(chrono::Utc::now()),
            });
            state.activities.update(&record).await?;
            ("Reaction added", record)
        }
    };

    tracing::debug!(
        user_id = %user.user_id,
        activity = %record.id,
        kind = %kind,
        message,
        "Reaction toggled"
    );

    let mut reaction_counts: HashMap<String, u32> = HashMap::new();
    for reaction in &record.reactions {
        *reaction_counts
            .entry(reaction.kind.emoji().to_string())
            .or_insert(0) += 1;
    }

    let user_reactions: Vec<ReactionKind> = record
        .reactions
        .iter()
        .filter(|r| r.user_id == user.user_id)
        .map(|r| r.kind)
        .collect();

    Ok(Json(ReactionResponse {
        message: message.to_string(),
        reaction_counts,
        user_reactions,
    }))
}

// ─── Comments ────────────────────────────────────────────────

#[derive(Deserialize)]
struct CommentRequest {
    text: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentResponse {
    pub message: String,
    pub comment: CommentView,
    pub comment_count: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteCommentResponse {
    pub message: String,
    pub comment_count: u32,
}

/// Add a comment to an activity record.
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<CommentResponse>> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidArgument(
            "Comment text is required".to_string(),
        ));
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::InvalidArgument(format!(
            "Comment text must be at most {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    let record = fetch_record(&state, id).await?;
    let record = reconcile_if_ranking(&state, record).await?;

    let comment = Comment {
        id: Uuid::new_v4(),
        user_id: user.user_id.clone(),
        text: text.to_string(),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let updated = state
        .activities
        .append_comment(record.id, comment.clone())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", record.id)))?;

    tracing::debug!(
        user_id = %user.user_id,
        activity = %record.id,
        "Comment added"
    );

    Ok(Json(CommentResponse {
        message: "Comment added".to_string(),
        comment: CommentView::from(comment),
        comment_count: updated.comments.len() as u32,
    }))
}

/// Delete the caller's own comment from an activity record.
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteCommentResponse>> {
    let mut record = fetch_record(&state, id).await?;

    let comment = record
        .comments
        .iter()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    if comment.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "You can only delete your own comments".to_string(),
        ));
    }

    record.comments.retain(|c| c.id != comment_id);
    state.activities.update(&record).await?;

    Ok(Json(DeleteCommentResponse {
        message: "Comment deleted".to_string(),
        comment_count: record.comments.len() as u32,
    }))
}

// ─── Cleanup ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CleanupResponse {
    pub scanned: u32,
    pub removed: u32,
}

/// Remove duplicate fact-bearing records for the calling user.
async fn cleanup_duplicates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CleanupResponse>> {
    let report = state.reconciler.sweep_user(&user.user_id).await?;

    Ok(Json(CleanupResponse {
        scanned: report.scanned as u32,
        removed: report.removed as u32,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = ActivityCursor {
            created_at: chrono::DateTime::from_timestamp(1_704_103_200, 123).unwrap(),
            id: Uuid::new_v4(),
        };

        let encoded = encode_cursor(cursor);
        let decoded = parse_cursor(Some(&encoded)).unwrap().unwrap();

        assert_eq!(decoded.created_at, cursor.created_at);
        assert_eq!(decoded.id, cursor.id);
    }

    #[test]
    fn test_cursor_rejects_invalid_input() {
        let err = parse_cursor(Some("not-base64")).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let missing_part = URL_SAFE_NO_PAD.encode("123:456");
        let err = parse_cursor(Some(&missing_part)).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Maintenance task routes.
//!
//! These endpoints are called by the deployment's scheduler, not
//! directly by users. They are guarded by the shared maintenance token
//! check in `middleware::tasks_auth`, applied in routes/mod.rs.

use crate::error::Result;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Maintenance task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/sweep-activities", post(sweep_activities))
}

#[derive(Serialize)]
pub struct SweepSummaryResponse {
    pub users: u32,
    pub scanned: u32,
    pub removed: u32,
}

/// Sweep duplicate fact-bearing records for every registered user.
///
/// A store failure part-way through aborts the pass with 503; the
/// sweep is idempotent, so the scheduler simply retries it.
async fn sweep_activities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepSummaryResponse>> {
    let users = state.users.list_users().await?;

    let mut scanned = 0u32;
    let mut removed = 0u32;
    for user in &users {
        let report = state.reconciler.sweep_user(&user.user_id).await?;
        scanned += report.scanned as u32;
        removed += report.removed as u32;
    }

    tracing::info!(
        users = users.len(),
        scanned,
        removed,
        "Completed activity sweep"
    );

    Ok(Json(SweepSummaryResponse {
        users: users.len() as u32,
        scanned,
        removed,
    }))
}

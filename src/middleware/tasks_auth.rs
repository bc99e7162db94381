// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maintenance task authentication middleware.
//!
//! `/tasks/*` routes are called by the deployment's scheduler, not by
//! browsers, and are guarded by a shared token distributed out-of-band.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header carrying the shared maintenance token.
pub const MAINTENANCE_TOKEN_HEADER: &str = "x-maintenance-token";

/// Require a valid maintenance token for `/tasks/*` routes.
pub async fn require_tasks_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(MAINTENANCE_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    let presented = match presented {
        Some(token) => token,
        None => {
            tracing::warn!("Blocked tasks request with missing maintenance token");
            return Err(StatusCode::FORBIDDEN);
        }
    };

    // Constant-time comparison to prevent timing attacks
    let matches: bool = subtle::ConstantTimeEq::ct_eq(
        presented.as_bytes(),
        state.config.maintenance_token.as_bytes(),
    )
    .into();

    if !matches {
        tracing::warn!("Blocked tasks request with invalid maintenance token");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

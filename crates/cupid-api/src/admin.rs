use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use cupid_types::api::CleanupSummary;

use crate::error::AppError;
use crate::state::AppState;
use crate::sweeper::sweep_expired;

/// Checks the bearer token when one is configured. Open otherwise.
fn authorize(headers: &HeaderMap, admin_token: Option<&str>) -> Result<(), AppError> {
    let Some(expected) = admin_token else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;
    if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Byte comparison without an early exit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

/// POST /admin/cleanup: run the retention sweep now.
pub async fn run_cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    authorize(&headers, state.settings.admin_token.as_deref())?;

    let report = sweep_expired(&state, Utc::now()).await?;

    Ok(Json(CleanupSummary {
        success: true,
        cleaned: report.cleaned,
        message: format!("Cleaned up {} expired proposals", report.cleaned),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PremiumRequest {
    pub premium: bool,
}

/// PUT /admin/proposals/{slug}/premium: exempt a proposal from expiry, or
/// make it subject to expiry again.
pub async fn set_premium(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(req): Json<PremiumRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&headers, state.settings.admin_token.as_deref())?;

    let db = state.db.clone();
    let target = slug.clone();
    let updated = tokio::task::spawn_blocking(move || db.set_premium(&target, req.premium))
        .await
        .map_err(anyhow::Error::from)??;
    if !updated {
        return Err(AppError::NotFound);
    }
    info!("Proposal {} premium = {}", slug, req.premium);
    Ok(StatusCode::NO_CONTENT)
}

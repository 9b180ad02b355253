use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use cupid_flow::submission::{PhotoUpload, ResponseDraft, submit};
use cupid_types::api::{DispatchRequest, DispatchResponse, SubmitResponseRequest, SubmitResponseResponse};

use crate::error::AppError;
use crate::proposals::{decode_photo, find_live};
use crate::state::AppState;

/// POST /proposals/{slug}/sessions: start viewing a proposal.
pub async fn start_session(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let definition = find_live(&state, &slug).await.ok_or(AppError::NotFound)?;
    let view = state.sessions.open(&definition).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.sessions.view(id).await.ok_or(AppError::NotFound)?;
    Ok(Json(view))
}

/// POST /sessions/{id}/events
pub async fn dispatch_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DispatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (view, effect) = state.sessions.dispatch(id, req.event).await?;
    Ok(Json(DispatchResponse { view, effect }))
}

/// POST /sessions/{id}/response: record the partner's answer.
///
/// Only one submission per session may be in flight. The session stays in
/// collection if persistence fails so the viewer can try again. The
/// submission finishes even if the client goes away mid-request.
pub async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let photo = req
        .photo
        .map(|p| decode_photo(p, state.settings.max_upload_bytes))
        .transpose()?
        .map(|p| PhotoUpload {
            file_name: p.file_name,
            bytes: p.bytes,
        });

    let ticket = state.sessions.begin_submission(id).await?;
    let respondent_name = req
        .respondent_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or(ticket.partner_name);
    let draft = ResponseDraft {
        respondent_name,
        sentiment: req.sentiment,
        message: req.message,
        photo,
    };

    // Runs detached so a dropped connection cannot leave the session stuck
    // in its submitting state.
    let task_state = state.clone();
    let sentiment = req.sentiment;
    let (result, view) = tokio::spawn(async move {
        let result = submit(&task_state.gateway, &ticket.slug, draft).await;
        let outcome = result.as_ref().ok().map(|_| sentiment);
        let view = task_state.sessions.finish_submission(id, outcome).await;
        (result, view)
    })
    .await
    .map_err(anyhow::Error::from)?;

    let view = view.ok_or(AppError::NotFound)?;
    let receipt = result?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponseResponse {
            response_id: receipt.response_id,
            photo_url: receipt.photo_url,
            confirmation: receipt.confirmation,
            view,
        }),
    ))
}

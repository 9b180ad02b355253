use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use cupid_flow::gateway::PersistenceGateway;
use cupid_types::api::ResponseListQuery;

use crate::error::AppError;
use crate::state::AppState;

/// GET /responses?slug=: stored responses, newest first.
pub async fn list_responses(
    State(state): State<AppState>,
    Query(query): Query<ResponseListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let responses = match query.slug.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => state.gateway.list_responses_for(slug).await?,
        None => state.gateway.list_responses().await?,
    };
    Ok(Json(responses))
}

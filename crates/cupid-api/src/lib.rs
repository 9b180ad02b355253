//! HTTP surface of the proposal service.
//!
//! Handlers are grouped by resource. [`router`] wires them together;
//! the binary adds CORS, tracing and the body limit around it.

pub mod admin;
pub mod error;
pub mod fallback;
pub mod files;
pub mod gateway;
pub mod proposals;
pub mod registry;
pub mod responses;
pub mod sessions;
pub mod state;
pub mod storage;
pub mod sweeper;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

/// Every route the service exposes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/expired", get(proposals::expired))
        .route("/proposals", post(proposals::create_proposal))
        .route("/proposals/{slug}/sessions", post(sessions::start_session))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/sessions/{id}/events", post(sessions::dispatch_event))
        .route("/sessions/{id}/response", post(sessions::submit_response))
        .route("/responses", get(responses::list_responses))
        .route("/files/{*path}", get(files::serve_file))
        .route("/admin/cleanup", post(admin::run_cleanup))
        .route("/admin/proposals/{slug}/premium", put(admin::set_premium))
        .route("/{slug}", get(proposals::get_proposal))
        .with_state(state)
}

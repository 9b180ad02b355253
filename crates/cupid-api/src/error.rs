use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cupid_flow::machine::FlowError;
use cupid_flow::submission::SubmissionError;
use cupid_types::api::ErrorBody;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Flow(FlowError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Flow(_) => StatusCode::CONFLICT,
            AppError::Submission(e) if e.is_retryable() => StatusCode::BAD_GATEWAY,
            AppError::Submission(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(e) = &self {
            error!("Request failed: {:#}", e);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

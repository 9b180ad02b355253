use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ConfettiStyle, Question, Sentiment, TimelineEntry};
use crate::session::{FlowEffect, FlowEvent, SessionView};

// -- Authoring --

/// An image attached to a request, base64-encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhotoPayload {
    pub file_name: String,
    pub data: String,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProposalRequest {
    pub proposer_name: String,
    pub partner_name: String,
    pub love_message: String,
    pub theme: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoPayload>,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub love_letter: Option<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    pub confetti_style: Option<ConfettiStyle>,
    pub ending_message: Option<String>,
    pub countdown_at: Option<DateTime<Utc>>,
    pub collect_responses: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CreateProposalResponse {
    pub slug: String,
    pub url: String,
    /// True when the definition only reached the local fallback store.
    pub stored_locally: bool,
}

// -- Sessions --

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub view: SessionView,
    pub effect: Option<FlowEffect>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchRequest {
    pub event: FlowEvent,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitResponseRequest {
    pub sentiment: Sentiment,
    #[serde(default)]
    pub message: String,
    /// Defaults to the proposal's partner name.
    pub respondent_name: Option<String>,
    pub photo: Option<PhotoPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponseResponse {
    pub response_id: Uuid,
    pub photo_url: Option<String>,
    pub confirmation: Confirmation,
    pub view: SessionView,
}

// -- Responses --

#[derive(Debug, Deserialize)]
pub struct ResponseListQuery {
    pub slug: Option<String>,
}

// -- Maintenance --

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupSummary {
    pub success: bool,
    pub cleaned: usize,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ExpiredNotice {
    pub title: String,
    pub message: String,
}

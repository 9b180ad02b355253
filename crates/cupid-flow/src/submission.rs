use chrono::Utc;
use cupid_types::api::Confirmation;
use cupid_types::models::{MAX_MESSAGE_CHARS, NewResponse, Sentiment};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::gateway::PersistenceGateway;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "avif"];

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("message is {chars} characters, the limit is {max}", max = MAX_MESSAGE_CHARS)]
    MessageTooLong { chars: usize },

    #[error("'{0}' is not an image")]
    NotAnImage(String),

    #[error("photo upload failed: {0}")]
    Upload(String),

    #[error("could not save the response: {0}")]
    Write(String),
}

impl SubmissionError {
    /// Validation failures are the caller's to fix; the rest may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upload(_) | Self::Write(_))
    }
}

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ResponseDraft {
    pub respondent_name: String,
    pub sentiment: Sentiment,
    pub message: String,
    pub photo: Option<PhotoUpload>,
}

impl ResponseDraft {
    /// Checks that need no network. Run before anything is uploaded.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        let chars = self.message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(SubmissionError::MessageTooLong { chars });
        }
        if let Some(photo) = &self.photo {
            if photo.bytes.is_empty() || image_extension(&photo.file_name).is_none() {
                return Err(SubmissionError::NotAnImage(photo.file_name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub response_id: Uuid,
    pub photo_url: Option<String>,
    pub confirmation: Confirmation,
}

/// Normalized extension of an image file name, or `None` for anything else.
pub fn image_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

pub fn confirmation_for(sentiment: Sentiment) -> Confirmation {
    let title = match sentiment {
        Sentiment::Affirmative => "Response sent! 💕",
        Sentiment::Declined => "Thank you for your honesty 💭",
        Sentiment::NotYet => "Take all the time you need 💭",
    };
    Confirmation {
        title: title.to_string(),
        description: "Your heartfelt reply has been delivered.".to_string(),
    }
}

/// Record a partner's answer.
///
/// An attached photo is uploaded first; if that fails nothing is written.
/// There is no retry here, the caller decides whether to try again.
pub async fn submit<G: PersistenceGateway>(
    gateway: &G,
    proposal_slug: &str,
    draft: ResponseDraft,
) -> Result<SubmissionReceipt, SubmissionError> {
    draft.validate()?;

    let photo_url = match draft.photo {
        Some(photo) => {
            // validate() already rejected non-images
            let ext = image_extension(&photo.file_name).unwrap_or("jpg");
            let path = format!(
                "responses/{}-response-{}.{}",
                proposal_slug,
                Utc::now().timestamp_millis(),
                ext
            );
            let url = gateway.upload_file(&photo.bytes, &path).await.map_err(|e| {
                error!("Response photo upload for {} failed: {:#}", proposal_slug, e);
                SubmissionError::Upload(e.to_string())
            })?;
            Some(url)
        }
        None => None,
    };

    let message = draft.message.trim();
    let response = NewResponse {
        proposal_slug: proposal_slug.to_string(),
        respondent_name: draft.respondent_name,
        sentiment: draft.sentiment,
        message: (!message.is_empty()).then(|| message.to_string()),
        photo_url: photo_url.clone(),
    };

    let response_id = gateway.create_response(&response).await.map_err(|e| {
        error!("Saving response for {} failed: {:#}", proposal_slug, e);
        SubmissionError::Write(e.to_string())
    })?;

    info!(
        "Response {} recorded for {} ({})",
        response_id, proposal_slug, response.sentiment
    );

    Ok(SubmissionReceipt {
        response_id,
        photo_url,
        confirmation: confirmation_for(response.sentiment),
    })
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{info, warn};

use cupid_flow::gateway::{FallbackStore, PersistenceGateway};
use cupid_flow::lookup::{Lookup, load_proposal};
use cupid_flow::slug::{generate_slug, is_valid_slug};
use cupid_flow::submission::image_extension;
use cupid_types::api::{CreateProposalRequest, CreateProposalResponse, ExpiredNotice, PhotoPayload};
use cupid_types::models::{
    DEFAULT_THEME, MAX_QUESTIONS, Photo, PhotoSource, ProposalDefinition,
};

use crate::error::AppError;
use crate::state::AppState;

/// An attached image after decoding and checks.
pub(crate) struct DecodedPhoto {
    pub file_name: String,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
    pub caption: String,
}

pub(crate) fn decode_photo(payload: PhotoPayload, max_bytes: usize) -> Result<DecodedPhoto, AppError> {
    let extension = image_extension(&payload.file_name).ok_or_else(|| {
        AppError::BadRequest(format!("'{}' is not an image", payload.file_name))
    })?;
    let bytes = B64
        .decode(payload.data.as_bytes())
        .map_err(|_| AppError::BadRequest(format!("'{}' is not valid base64", payload.file_name)))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest(format!("'{}' is empty", payload.file_name)));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge { limit: max_bytes });
    }
    Ok(DecodedPhoto {
        file_name: payload.file_name,
        extension,
        bytes,
        caption: payload.caption,
    })
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn required(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// POST /proposals: author and publish a proposal.
///
/// Photos that cannot be uploaded are kept inline. A definition the
/// database refuses is written to the fallback store instead.
pub async fn create_proposal(
    State(state): State<AppState>,
    Json(req): Json<CreateProposalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(proposer_name), Some(partner_name), Some(love_message)) = (
        required(&req.proposer_name),
        required(&req.partner_name),
        required(&req.love_message),
    ) else {
        return Err(AppError::BadRequest("Please fill in all the required fields".into()));
    };
    if req.questions.len() > MAX_QUESTIONS {
        return Err(AppError::BadRequest(format!(
            "At most {} questions are allowed",
            MAX_QUESTIONS
        )));
    }

    let photos = req
        .photos
        .into_iter()
        .map(|p| decode_photo(p, state.settings.max_upload_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    let now = Utc::now();
    let slug = generate_slug(&proposer_name, &partner_name, now.timestamp_millis());
    if !is_valid_slug(&slug) {
        return Err(AppError::BadRequest("Names produce an unusable link".into()));
    }

    let mut stored_photos = Vec::with_capacity(photos.len());
    for photo in photos {
        let path = format!(
            "proposals/{}/{}-{}.{}",
            slug,
            Utc::now().timestamp_millis(),
            random_suffix(),
            photo.extension
        );
        let uploaded = state.gateway.upload_file(&photo.bytes, &path).await;
        let source = match uploaded {
            Ok(url) => PhotoSource::Remote { url },
            Err(e) => {
                warn!("Upload of {} failed, keeping it inline: {:#}", photo.file_name, e);
                PhotoSource::Local { bytes: photo.bytes }
            }
        };
        stored_photos.push(Photo {
            source,
            caption: photo.caption,
        });
    }

    let definition = ProposalDefinition {
        slug: slug.clone(),
        proposer_name,
        partner_name,
        love_message,
        theme: req.theme.unwrap_or_else(|| DEFAULT_THEME.to_string()),
        photos: stored_photos,
        questions: req.questions,
        love_letter: req.love_letter,
        timeline: req.timeline,
        confetti_style: req.confetti_style.unwrap_or_default(),
        ending_message: req.ending_message,
        countdown_at: req.countdown_at,
        collect_responses: req.collect_responses.unwrap_or(true),
        is_premium: false,
        created_at: now,
        expires_at: now + Duration::days(state.settings.retention_days),
    };

    let stored_locally = match state.gateway.create_proposal(&definition).await {
        Ok(_) => false,
        Err(e) => {
            warn!("Saving proposal {} failed, using fallback store: {:#}", slug, e);
            state.fallback.write(&definition).await?;
            true
        }
    };

    info!("Published proposal {}", slug);
    let url = format!("{}/{}", state.settings.public_url.trim_end_matches('/'), slug);
    Ok((
        StatusCode::CREATED,
        Json(CreateProposalResponse {
            slug,
            url,
            stored_locally,
        }),
    ))
}

/// Load a proposal that is still live. Expired ones count as missing.
pub(crate) async fn find_live(state: &AppState, slug: &str) -> Option<ProposalDefinition> {
    if !is_valid_slug(slug) {
        return None;
    }
    match load_proposal(&state.gateway, &state.fallback, slug).await {
        Lookup::Found { definition, .. } if !definition.is_expired(Utc::now()) => Some(*definition),
        Lookup::Found { .. } => {
            info!("Proposal {} has expired", slug);
            None
        }
        Lookup::NotFound => None,
    }
}

/// GET /{slug}: the published definition, or a redirect to `/expired`.
pub async fn get_proposal(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match find_live(&state, &slug).await {
        Some(definition) => Json(definition).into_response(),
        None => Redirect::temporary("/expired").into_response(),
    }
}

/// GET /expired
pub async fn expired() -> impl IntoResponse {
    Json(ExpiredNotice {
        title: "💔 This magical proposal has faded...".into(),
        message: "But love never fades. This story may have expired, but yours can begin again."
            .into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_checks() {
        let ok = PhotoPayload {
            file_name: "us.PNG".into(),
            data: B64.encode([1u8, 2, 3]),
            caption: "us".into(),
        };
        let decoded = decode_photo(ok.clone(), 10).unwrap();
        assert_eq!(decoded.extension, "png");
        assert_eq!(decoded.bytes, vec![1, 2, 3]);

        assert!(matches!(decode_photo(ok, 2), Err(AppError::PayloadTooLarge { limit: 2 })));

        let text = PhotoPayload {
            file_name: "notes.txt".into(),
            data: B64.encode([1u8]),
            caption: String::new(),
        };
        assert!(matches!(decode_photo(text, 10), Err(AppError::BadRequest(_))));

        let garbled = PhotoPayload {
            file_name: "us.jpg".into(),
            data: "not base64!".into(),
            caption: String::new(),
        };
        assert!(matches!(decode_photo(garbled, 10), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}

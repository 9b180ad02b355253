/// Database row types. These map directly to SQLite rows; JSON columns stay
/// as text until converted to the cupid-types models.

use anyhow::{Context, Result, anyhow};
use cupid_types::models::{NewResponse, ProposalDefinition, ProposalResponse};
use uuid::Uuid;

use crate::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone)]
pub struct ProposalRow {
    pub slug: String,
    pub proposer_name: String,
    pub partner_name: String,
    pub love_message: String,
    pub theme: String,
    pub photos: String,
    pub questions: String,
    pub love_letter: Option<String>,
    pub timeline: String,
    pub confetti_style: String,
    pub ending_message: Option<String>,
    pub countdown_at: Option<String>,
    pub collect_responses: bool,
    pub is_premium: bool,
    pub created_at: String,
    pub expires_at: String,
}

impl ProposalRow {
    pub fn from_definition(def: &ProposalDefinition) -> Result<Self> {
        Ok(Self {
            slug: def.slug.clone(),
            proposer_name: def.proposer_name.clone(),
            partner_name: def.partner_name.clone(),
            love_message: def.love_message.clone(),
            theme: def.theme.clone(),
            photos: serde_json::to_string(&def.photos)?,
            questions: serde_json::to_string(&def.questions)?,
            love_letter: def.love_letter.clone(),
            timeline: serde_json::to_string(&def.timeline)?,
            confetti_style: def.confetti_style.as_str().to_string(),
            ending_message: def.ending_message.clone(),
            countdown_at: def.countdown_at.as_ref().map(format_timestamp),
            collect_responses: def.collect_responses,
            is_premium: def.is_premium,
            created_at: format_timestamp(&def.created_at),
            expires_at: format_timestamp(&def.expires_at),
        })
    }

    pub fn into_definition(self) -> Result<ProposalDefinition> {
        let slug = self.slug;
        Ok(ProposalDefinition {
            photos: serde_json::from_str(&self.photos)
                .with_context(|| format!("Corrupt photos on proposal '{}'", slug))?,
            questions: serde_json::from_str(&self.questions)
                .with_context(|| format!("Corrupt questions on proposal '{}'", slug))?,
            timeline: serde_json::from_str(&self.timeline)
                .with_context(|| format!("Corrupt timeline on proposal '{}'", slug))?,
            confetti_style: self.confetti_style.parse().map_err(|e: String| anyhow!(e))?,
            countdown_at: self.countdown_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            expires_at: parse_timestamp(&self.expires_at)?,
            proposer_name: self.proposer_name,
            partner_name: self.partner_name,
            love_message: self.love_message,
            theme: self.theme,
            love_letter: self.love_letter,
            ending_message: self.ending_message,
            collect_responses: self.collect_responses,
            is_premium: self.is_premium,
            slug,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResponseRow {
    pub id: String,
    pub proposal_slug: String,
    pub respondent_name: String,
    pub response_type: String,
    pub message: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
}

impl ResponseRow {
    pub fn new(id: Uuid, response: &NewResponse, created_at: &chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id: id.to_string(),
            proposal_slug: response.proposal_slug.clone(),
            respondent_name: response.respondent_name.clone(),
            response_type: response.sentiment.as_str().to_string(),
            message: response.message.clone(),
            photo_url: response.photo_url.clone(),
            created_at: format_timestamp(created_at),
        }
    }

    pub fn into_response(self) -> Result<ProposalResponse> {
        Ok(ProposalResponse {
            id: self
                .id
                .parse()
                .with_context(|| format!("Corrupt response id '{}'", self.id))?,
            sentiment: self.response_type.parse().map_err(|e: String| anyhow!(e))?,
            created_at: parse_timestamp(&self.created_at)?,
            proposal_slug: self.proposal_slug,
            respondent_name: self.respondent_name,
            message: self.message,
            photo_url: self.photo_url,
        })
    }
}

/// What the sweeper needs to know about an expired proposal.
#[derive(Debug, Clone)]
pub struct ExpiredRow {
    pub slug: String,
    pub photos: String,
}

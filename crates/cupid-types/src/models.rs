use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on the number of questions in an authored set.
pub const MAX_QUESTIONS: usize = 6;

/// Upper bound on a response message, counted in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

/// One yes/no step of the narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub affirmative_label: String,
    pub evasive_label: String,
}

impl Question {
    pub fn new(id: &str, prompt: &str, affirmative_label: &str, evasive_label: &str) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            affirmative_label: affirmative_label.to_string(),
            evasive_label: evasive_label.to_string(),
        }
    }
}

/// The respondent's answer to the final proposal.
///
/// Serialized with the short names the response table stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "yes")]
    Affirmative,
    #[serde(rename = "no")]
    Declined,
    #[serde(rename = "not_yet")]
    NotYet,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Affirmative => "yes",
            Self::Declined => "no",
            Self::NotYet => "not_yet",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Affirmative),
            "no" => Ok(Self::Declined),
            "not_yet" => Ok(Self::NotYet),
            other => Err(format!("unknown sentiment '{}'", other)),
        }
    }
}

/// Where a photo's bytes live.
///
/// `Remote` is the normal case after a successful upload. `Local` only
/// appears when authoring could not reach storage and kept the bytes inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoSource {
    Local {
        #[serde(with = "base64_bytes")]
        bytes: Vec<u8>,
    },
    Remote {
        url: String,
    },
}

impl PhotoSource {
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::Remote { url } => Some(url),
            Self::Local { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub source: PhotoSource,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Particle style used by the celebratory effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfettiStyle {
    #[default]
    Hearts,
    Stars,
    Petals,
    Bubbles,
    Rings,
    Mixed,
}

impl ConfettiStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hearts => "hearts",
            Self::Stars => "stars",
            Self::Petals => "petals",
            Self::Bubbles => "bubbles",
            Self::Rings => "rings",
            Self::Mixed => "mixed",
        }
    }

    pub fn palette(&self) -> &'static [&'static str] {
        match self {
            Self::Hearts => &["💖", "💕", "💗", "💘", "❤️"],
            Self::Stars => &["✨", "⭐", "🌟", "💫", "⚡"],
            Self::Petals => &["🌹", "🌸", "🌺", "🌻", "🌷"],
            Self::Bubbles => &["🫧", "💎", "🥂", "🍾", "✨"],
            Self::Rings => &["💍", "💎", "👑", "💖", "✨"],
            Self::Mixed => &["💖", "✨", "💍", "🌹", "🎉"],
        }
    }
}

impl FromStr for ConfettiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hearts" => Ok(Self::Hearts),
            "stars" => Ok(Self::Stars),
            "petals" => Ok(Self::Petals),
            "bubbles" => Ok(Self::Bubbles),
            "rings" => Ok(Self::Rings),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown confetti style '{}'", other)),
        }
    }
}

pub const DEFAULT_THEME: &str = "romantic-garden";

/// A published proposal. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDefinition {
    pub slug: String,
    pub proposer_name: String,
    pub partner_name: String,
    pub love_message: String,
    pub theme: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub love_letter: Option<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub confetti_style: ConfettiStyle,
    #[serde(default)]
    pub ending_message: Option<String>,
    #[serde(default)]
    pub countdown_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub collect_responses: bool,
    #[serde(default)]
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ProposalDefinition {
    /// Past its retention deadline and not kept alive by premium.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_premium && self.expires_at < now
    }
}

fn default_true() -> bool {
    true
}

/// A response as it is handed to persistence, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResponse {
    pub proposal_slug: String,
    pub respondent_name: String,
    pub sentiment: Sentiment,
    pub message: Option<String>,
    pub photo_url: Option<String>,
}

/// A stored partner response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub id: Uuid,
    pub proposal_slug: String,
    pub respondent_name: String,
    pub sentiment: Sentiment,
    pub message: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        B64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

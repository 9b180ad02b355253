use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ConfettiStyle, Sentiment};

/// Position of a viewing session in the proposal narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// The proposal could not be loaded. Terminal.
    NotFound,
    Intro,
    Question { index: usize },
    CelebrationInterstitial,
    Transition,
    FinalProposal,
    ResponseCollection,
    ResponseSubmitted { sentiment: Sentiment },
    /// Ending used by proposals that do not collect responses. Terminal.
    Celebration,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Intro => "intro",
            Self::Question { .. } => "question",
            Self::CelebrationInterstitial => "celebration_interstitial",
            Self::Transition => "transition",
            Self::FinalProposal => "final_proposal",
            Self::ResponseCollection => "response_collection",
            Self::ResponseSubmitted { .. } => "response_submitted",
            Self::Celebration => "celebration",
        }
    }
}

/// Events a session can be driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FlowEvent {
    /// "Start" on the intro screen
    Begin,
    /// The affirmative button on a question or on the final proposal
    Affirm,
    /// The evasive button on a question
    Decline,
    /// The celebration interstitial finished playing
    InterstitialComplete,
    /// "Tell me..." on the transition screen
    Reveal,
    /// Raised internally once the response was persisted
    SubmissionSucceeded { sentiment: Sentiment },
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Affirm => "affirm",
            Self::Decline => "decline",
            Self::InterstitialComplete => "interstitial_complete",
            Self::Reveal => "reveal",
            Self::SubmissionSucceeded { .. } => "submission_succeeded",
        }
    }
}

/// Side signals for the rendering layer. Not part of the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FlowEffect {
    /// The evasive button moved; show a playful message.
    Encourage {
        message: String,
        offset_x: f64,
        offset_y: f64,
        scale: f64,
        label_visible: bool,
    },
    /// Start the confetti burst with the style's particle set.
    StartCelebration {
        style: ConfettiStyle,
        palette: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvasiveView {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub prompt: String,
    pub affirmative_label: String,
    /// `None` once the button has shrunk too far to show its text.
    pub evasive_label: Option<String>,
}

/// Snapshot of a viewing session returned by every session route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub slug: String,
    pub step: Step,
    pub proposer_name: String,
    pub partner_name: String,
    pub question: Option<QuestionView>,
    pub evasive: EvasiveView,
    pub countdown: Option<TimeLeft>,
    pub submitting: bool,
    /// No further events are accepted.
    pub finished: bool,
}

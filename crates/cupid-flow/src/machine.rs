use chrono::{DateTime, Utc};
use cupid_types::models::{ConfettiStyle, ProposalDefinition, Question};
use cupid_types::session::{FlowEffect, FlowEvent, Step, TimeLeft};
use rand::Rng;
use thiserror::Error;

use crate::countdown::time_left;
use crate::evasive::EvasiveButton;
use crate::questions::resolve_questions;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("proposal not found")]
    NotFound,

    #[error("'{event}' is not allowed during '{step}'")]
    InvalidEvent {
        step: &'static str,
        event: &'static str,
    },

    #[error(
        "the proposal opens in {}d {}h {}m {}s",
        .0.days, .0.hours, .0.minutes, .0.seconds
    )]
    CountdownPending(TimeLeft),
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub step: Step,
    pub effect: Option<FlowEffect>,
}

/// One viewer's walk through a proposal.
///
/// Steps only move forward:
/// intro → question* → celebration_interstitial → transition →
/// final_proposal → response_collection → response_submitted.
/// Proposals that do not collect responses end in `celebration` instead.
/// A session created for a missing proposal sits in `not_found` forever.
#[derive(Debug, Clone)]
pub struct Flow<R> {
    step: Step,
    questions: Vec<Question>,
    button: EvasiveButton,
    confetti_style: ConfettiStyle,
    countdown_at: Option<DateTime<Utc>>,
    collect_responses: bool,
    rng: R,
}

impl<R: Rng> Flow<R> {
    pub fn new(definition: &ProposalDefinition, rng: R) -> Self {
        Self {
            step: Step::Intro,
            questions: resolve_questions(Some(&definition.questions)),
            button: EvasiveButton::default(),
            confetti_style: definition.confetti_style,
            countdown_at: definition.countdown_at,
            collect_responses: definition.collect_responses,
            rng,
        }
    }

    pub fn not_found(rng: R) -> Self {
        Self {
            step: Step::NotFound,
            questions: Vec::new(),
            button: EvasiveButton::default(),
            confetti_style: ConfettiStyle::default(),
            countdown_at: None,
            collect_responses: false,
            rng,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn button(&self) -> &EvasiveButton {
        &self.button
    }

    /// The question on screen, if the session is in the question loop.
    pub fn current_question(&self) -> Option<(usize, &Question)> {
        match self.step {
            Step::Question { index } => self.questions.get(index).map(|q| (index, q)),
            _ => None,
        }
    }

    /// Time left before `begin` is accepted, if a countdown is still running.
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<TimeLeft> {
        self.countdown_at.and_then(|deadline| time_left(deadline, now))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.step,
            Step::NotFound | Step::ResponseSubmitted { .. } | Step::Celebration
        )
    }

    pub fn dispatch(&mut self, event: FlowEvent) -> Result<Outcome, FlowError> {
        self.dispatch_at(event, Utc::now())
    }

    /// Apply `event` as of `now`. On error the step is left untouched.
    pub fn dispatch_at(&mut self, event: FlowEvent, now: DateTime<Utc>) -> Result<Outcome, FlowError> {
        let mut effect = None;

        let next = match (self.step, event) {
            (Step::NotFound, _) => return Err(FlowError::NotFound),

            (Step::Intro, FlowEvent::Begin) => {
                if let Some(left) = self.countdown(now) {
                    return Err(FlowError::CountdownPending(left));
                }
                self.button.reset();
                Step::Question { index: 0 }
            }

            (Step::Question { index }, FlowEvent::Affirm) => {
                self.button.reset();
                if index + 1 < self.questions.len() {
                    Step::Question { index: index + 1 }
                } else {
                    Step::CelebrationInterstitial
                }
            }

            (Step::Question { index }, FlowEvent::Decline) => {
                let decline = self.button.on_decline(&mut self.rng);
                effect = Some(FlowEffect::Encourage {
                    message: decline.encouragement.to_string(),
                    offset_x: decline.offset_x,
                    offset_y: decline.offset_y,
                    scale: decline.scale,
                    label_visible: self.button.label_visible(),
                });
                Step::Question { index }
            }

            (Step::CelebrationInterstitial, FlowEvent::InterstitialComplete) => Step::Transition,

            (Step::Transition, FlowEvent::Reveal) => Step::FinalProposal,

            (Step::FinalProposal, FlowEvent::Affirm) => {
                effect = Some(FlowEffect::StartCelebration {
                    style: self.confetti_style,
                    palette: self
                        .confetti_style
                        .palette()
                        .iter()
                        .map(|p| p.to_string())
                        .collect(),
                });
                if self.collect_responses {
                    Step::ResponseCollection
                } else {
                    Step::Celebration
                }
            }

            (Step::ResponseCollection, FlowEvent::SubmissionSucceeded { sentiment }) => {
                Step::ResponseSubmitted { sentiment }
            }

            (step, event) => {
                return Err(FlowError::InvalidEvent {
                    step: step.name(),
                    event: event.name(),
                });
            }
        };

        self.step = next;
        Ok(Outcome { step: next, effect })
    }
}

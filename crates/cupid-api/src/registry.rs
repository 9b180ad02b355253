use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use cupid_flow::machine::Flow;
use cupid_types::models::{ProposalDefinition, Sentiment};
use cupid_types::session::{
    EvasiveView, FlowEffect, FlowEvent, QuestionView, SessionView, Step,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::AppError;

/// One viewer's state, owned by the registry.
struct Session {
    flow: Flow<StdRng>,
    slug: String,
    proposer_name: String,
    partner_name: String,
    /// Set while a response submission is awaiting persistence.
    submitting: bool,
    last_seen: Instant,
}

impl Session {
    fn view(&self, session_id: Uuid, now: DateTime<Utc>) -> SessionView {
        let button = self.flow.button();
        let question = self.flow.current_question().map(|(index, q)| QuestionView {
            index,
            total: self.flow.questions().len(),
            prompt: q.prompt.clone(),
            affirmative_label: q.affirmative_label.clone(),
            evasive_label: button.label_visible().then(|| q.evasive_label.clone()),
        });
        let step = self.flow.step();
        SessionView {
            session_id,
            slug: self.slug.clone(),
            step,
            proposer_name: self.proposer_name.clone(),
            partner_name: self.partner_name.clone(),
            question,
            evasive: EvasiveView {
                offset_x: button.offset_x,
                offset_y: button.offset_y,
                scale: button.scale,
            },
            countdown: match step {
                Step::Intro => self.flow.countdown(now),
                _ => None,
            },
            submitting: self.submitting,
            finished: self.flow.is_terminal(),
        }
    }
}

/// What a submission needs to know about its session.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub slug: String,
    pub partner_name: String,
}

/// Live viewing sessions keyed by id.
///
/// The lock is never held across persistence calls. A submission marks
/// its session busy, drops the lock, and re-acquires it to record the
/// outcome; anything that arrives for a busy session is refused.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    /// Start a session at the intro of `definition`.
    pub async fn open(&self, definition: &ProposalDefinition) -> SessionView {
        let id = Uuid::new_v4();
        let session = Session {
            flow: Flow::new(definition, StdRng::from_os_rng()),
            slug: definition.slug.clone(),
            proposer_name: definition.proposer_name.clone(),
            partner_name: definition.partner_name.clone(),
            submitting: false,
            last_seen: Instant::now(),
        };
        let view = session.view(id, Utc::now());
        self.inner.write().await.insert(id, session);
        debug!("Opened session {} for {}", id, definition.slug);
        view
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn view(&self, id: Uuid) -> Option<SessionView> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id)?;
        session.last_seen = Instant::now();
        Some(session.view(id, Utc::now()))
    }

    /// Apply a viewer event. `submission_succeeded` is raised by the
    /// server alone and is refused here.
    pub async fn dispatch(
        &self,
        id: Uuid,
        event: FlowEvent,
    ) -> Result<(SessionView, Option<FlowEffect>), AppError> {
        if matches!(event, FlowEvent::SubmissionSucceeded { .. }) {
            return Err(AppError::BadRequest(
                "submission_succeeded cannot be sent by clients".into(),
            ));
        }

        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::NotFound)?;
        session.last_seen = Instant::now();
        if session.submitting {
            return Err(AppError::Conflict("A response is being submitted".into()));
        }

        let now = Utc::now();
        let outcome = session.flow.dispatch_at(event, now)?;
        debug!("Session {}: {} -> {}", id, event.name(), outcome.step.name());
        Ok((session.view(id, now), outcome.effect))
    }

    /// Mark the session busy ahead of a submission.
    pub async fn begin_submission(&self, id: Uuid) -> Result<SubmissionTicket, AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::NotFound)?;
        session.last_seen = Instant::now();

        let step = session.flow.step();
        if step != Step::ResponseCollection {
            return Err(AppError::Conflict(format!(
                "Responses are not being collected during '{}'",
                step.name()
            )));
        }
        if session.submitting {
            return Err(AppError::Conflict("A response is already being submitted".into()));
        }

        session.submitting = true;
        Ok(SubmissionTicket {
            slug: session.slug.clone(),
            partner_name: session.partner_name.clone(),
        })
    }

    /// Clear the busy mark. On success the session moves to
    /// `response_submitted`; on failure it stays in collection.
    pub async fn finish_submission(&self, id: Uuid, outcome: Option<Sentiment>) -> Option<SessionView> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id)?;
        session.submitting = false;
        session.last_seen = Instant::now();

        if let Some(sentiment) = outcome {
            if let Err(e) = session
                .flow
                .dispatch(FlowEvent::SubmissionSucceeded { sentiment })
            {
                error!("Session {} could not record its submission: {}", id, e);
            }
        }
        Some(session.view(id, Utc::now()))
    }

    /// Drop sessions idle for longer than `ttl`. Busy sessions are kept.
    pub async fn prune_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.submitting || s.last_seen.elapsed() < ttl);
        before - sessions.len()
    }
}

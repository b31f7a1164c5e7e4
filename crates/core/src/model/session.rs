use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur while running a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has no trials")]
    Empty,

    #[error("session already completed")]
    SessionComplete,
}

//
// ─── TRIAL OUTCOME ─────────────────────────────────────────────────────────────
//

/// Record of one answered trial.
///
/// `correct` is derived at response time: "yes" is correct exactly when the
/// shown label is the base item, "no" exactly when it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialOutcome {
    pub index: usize,
    pub label: String,
    pub said_yes: bool,
    pub correct: bool,
}

/// Final score of a session: correct responses out of total trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionScore {
    pub correct: u32,
    pub total: u32,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory run of trials against a base item.
///
/// The label sequence is fixed at construction and never resized; the session
/// steps through it one response at a time, keeping a running correct count.
/// Once the cursor reaches the end the session is terminal and read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_item: String,
    labels: Vec<String>,
    outcomes: Vec<TrialOutcome>,
    current: usize,
    correct: u32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session over a pre-generated label sequence.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `labels` is empty.
    pub fn new(
        base_item: impl Into<String>,
        labels: Vec<String>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if labels.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            base_item: base_item.into(),
            labels,
            outcomes: Vec::new(),
            current: 0,
            correct: 0,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn base_item(&self) -> &str {
        &self.base_item
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Total number of trials in this session.
    #[must_use]
    pub fn total_trials(&self) -> usize {
        self.labels.len()
    }

    /// Number of trials that have already been answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of trials still awaiting a response.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.labels.len().saturating_sub(self.current)
    }

    /// Label of the trial awaiting a response, if any.
    #[must_use]
    pub fn current_label(&self) -> Option<&str> {
        self.labels.get(self.current).map(String::as_str)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Running score; final once the session is complete.
    #[must_use]
    pub fn score(&self) -> SessionScore {
        SessionScore {
            correct: self.correct,
            total: u32::try_from(self.labels.len()).unwrap_or(u32::MAX),
        }
    }

    /// Record the subject's yes/no response for the current trial and advance.
    ///
    /// `responded_at` should come from the services layer clock; it is only
    /// used to latch the completion timestamp on the last trial.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionComplete` if every trial has already
    /// been answered.
    pub fn record_response(
        &mut self,
        said_yes: bool,
        responded_at: DateTime<Utc>,
    ) -> Result<&TrialOutcome, SessionError> {
        if self.is_complete() {
            return Err(SessionError::SessionComplete);
        }
        let Some(label) = self.labels.get(self.current) else {
            return Err(SessionError::SessionComplete);
        };

        let is_base = *label == self.base_item;
        let correct = said_yes == is_base;
        if correct {
            self.correct += 1;
        }

        self.outcomes.push(TrialOutcome {
            index: self.current,
            label: label.clone(),
            said_yes,
            correct,
        });

        self.current += 1;
        if self.current >= self.labels.len() {
            self.completed_at = Some(responded_at);
        }

        self.outcomes.last().ok_or(SessionError::SessionComplete)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

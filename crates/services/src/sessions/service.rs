use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use percept_core::Clock;
use percept_core::model::{Category, PresentationMode, Session, SessionScore, TrialOutcome};

use super::progress::SessionProgress;
use super::sequence::SequenceBuilder;
use crate::error::{StimulusError, TaskError};
use crate::stimulus::{StimulusPick, StimulusStore};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Raw run configuration, as it arrives from the CLI.
///
/// Names are resolved against the catalog and presentation modes during
/// [`TaskService::start`]; every validation failure there is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    pub category: String,
    pub base_item: String,
    pub trial_count: u32,
    pub presentation: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            category: "fruit".into(),
            base_item: "apple".into(),
            trial_count: 10,
            presentation: "single300".into(),
        }
    }
}

//
// ─── ANSWER RESULT ─────────────────────────────────────────────────────────────
//

/// Result of answering a single trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialAnswer {
    pub outcome: TrialOutcome,
    pub is_complete: bool,
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Serializable record of a finished (or in-flight) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub category: Category,
    pub base_item: String,
    pub presentation: PresentationMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: SessionScore,
    pub trials: Vec<TrialOutcome>,
}

impl SessionReport {
    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//
// ─── TASK SERVICE ──────────────────────────────────────────────────────────────
//

/// Orchestrates one experiment run: validates the configuration, generates
/// the full trial sequence up front, and steps through responses while
/// resolving a stimulus image per trial.
pub struct TaskService {
    category: Category,
    presentation: PresentationMode,
    session: Session,
    store: StimulusStore,
    shown: Vec<PathBuf>,
}

impl TaskService {
    /// Validate the configuration and start a session.
    ///
    /// The whole sequence is generated here, before any stimulus is shown.
    /// Every catalog member must have at least one image in the store.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Catalog` / `Presentation` / `Sequence` for invalid
    /// configuration and `TaskError::Stimulus` when a member has no images.
    pub fn start<R: Rng + ?Sized>(
        config: &TaskConfig,
        store: StimulusStore,
        clock: &Clock,
        rng: &mut R,
    ) -> Result<Self, TaskError> {
        let category = Category::from_name(&config.category)?;
        let presentation = PresentationMode::from_name(&config.presentation)?;

        for member in category.members() {
            let available = store.images_for(member)?;
            if available.is_empty() {
                return Err(StimulusError::NoImages {
                    item: (*member).to_string(),
                    dir: store.root().to_path_buf(),
                }
                .into());
            }
            log::info!("{} images available for {member}", available.len());
        }

        let labels = SequenceBuilder::new(category.members(), &config.base_item)
            .generate(config.trial_count, rng)?;
        let session = Session::new(config.base_item.clone(), labels, clock.now())?;

        Ok(Self {
            category,
            presentation,
            session,
            store,
            shown: Vec::new(),
        })
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn presentation(&self) -> PresentationMode {
        self.presentation
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::of(&self.session)
    }

    /// Resolve a stimulus image for the trial awaiting a response.
    ///
    /// Returns `None` once the session is complete. The picked path is
    /// recorded as shown so later trials avoid it until the pool runs out.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Stimulus` when the image lookup fails.
    pub fn current_stimulus<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<StimulusPick>, TaskError> {
        let Some(label) = self.session.current_label() else {
            return Ok(None);
        };
        let pick = self.store.pick(label, &self.shown, rng)?;
        self.shown.push(pick.path().to_path_buf());
        Ok(Some(pick))
    }

    /// Record the subject's response for the current trial.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Session` when the session is already complete.
    pub fn answer_current(
        &mut self,
        said_yes: bool,
        clock: &Clock,
    ) -> Result<TrialAnswer, TaskError> {
        let outcome = self
            .session
            .record_response(said_yes, clock.now())?
            .clone();
        Ok(TrialAnswer {
            outcome,
            is_complete: self.session.is_complete(),
        })
    }

    /// Snapshot of the run for operator-facing output or a report file.
    #[must_use]
    pub fn report(&self) -> SessionReport {
        SessionReport {
            category: self.category,
            base_item: self.session.base_item().to_string(),
            presentation: self.presentation,
            started_at: self.session.started_at(),
            completed_at: self.session.completed_at(),
            score: self.session.score(),
            trials: self.session.outcomes().to_vec(),
        }
    }
}

impl fmt::Debug for TaskService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskService")
            .field("category", &self.category)
            .field("presentation", &self.presentation)
            .field("total_trials", &self.session.total_trials())
            .field("answered", &self.session.answered_count())
            .field("shown_len", &self.shown.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use percept_core::model::{CatalogError, PresentationError, SessionError};

/// Errors emitted while generating a trial sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("base item {item:?} is not a member of the category")]
    InvalidBaseItem { item: String },

    #[error("trial count must be between 1 and 40, got {got}")]
    InvalidTrialCount { got: u32 },

    #[error("category has no alternatives besides the base item")]
    EmptyAlternatives,
}

/// Errors emitted by the stimulus store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StimulusError {
    #[error("stimulus directory {} does not exist", path.display())]
    MissingRoot { path: PathBuf },

    #[error("item {item:?} has no images under {}", dir.display())]
    NoImages { item: String, dir: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors emitted while setting up or running a task session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Presentation(#[from] PresentationError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Stimulus(#[from] StimulusError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl TaskError {
    /// True for configuration problems the operator must fix before a run
    /// can start, as opposed to I/O failures mid-run.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            TaskError::Catalog(_)
            | TaskError::Presentation(_)
            | TaskError::Sequence(_)
            | TaskError::Session(_) => true,
            TaskError::Stimulus(err) => {
                matches!(
                    err,
                    StimulusError::MissingRoot { .. } | StimulusError::NoImages { .. }
                )
            }
        }
    }
}

/// Errors emitted by the image prep pipeline and crop helpers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("crop selection spans no area")]
    EmptySelection,

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

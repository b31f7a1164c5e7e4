#![forbid(unsafe_code)]

pub mod crop;
pub mod error;
pub mod pipeline;
pub mod sessions;
pub mod stimulus;

pub use percept_core::Clock;
pub use sessions as session;

pub use error::{PipelineError, SequenceError, StimulusError, TaskError};

pub use crop::{CropRect, OutputNamer};
pub use pipeline::StageReport;
pub use sessions::{
    MAX_TRIALS, SequenceBuilder, SessionProgress, SessionReport, TaskConfig, TaskService,
    TrialAnswer,
};
pub use stimulus::{Freshness, StimulusPick, StimulusStore};

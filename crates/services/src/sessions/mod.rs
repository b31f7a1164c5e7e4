mod progress;
mod sequence;
mod service;

// Public API of the session subsystem.
pub use crate::error::{SequenceError, TaskError};
pub use progress::SessionProgress;
pub use sequence::{MAX_TRIALS, SequenceBuilder};
pub use service::{SessionReport, TaskConfig, TaskService, TrialAnswer};

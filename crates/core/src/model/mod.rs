mod catalog;
mod presentation;
mod session;

pub use catalog::{CatalogError, Category};
pub use presentation::{Frame, FrameKind, PresentationError, PresentationMode};
pub use session::{Session, SessionError, SessionScore, TrialOutcome};

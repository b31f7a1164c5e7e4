use percept_core::model::Session;

/// Aggregated view of session progress for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        Self {
            total: session.total_trials(),
            answered: session.answered_count(),
            remaining: session.remaining(),
            is_complete: session.is_complete(),
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur when resolving a presentation mode by name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PresentationError {
    #[error("unknown presentation mode: {0}")]
    InvalidPresentation(String),
}

//
// ─── PRESENTATION MODE ─────────────────────────────────────────────────────────
//

/// How each stimulus is shown to the subject.
///
/// Rendering itself belongs to the presentation layer; a mode only fixes the
/// timing contract via [`PresentationMode::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationMode {
    /// Stimulus stays on screen until the subject responds.
    Continuous,
    /// One brief flash: 100 ms blank, 200 ms stimulus, blank until response.
    Single300,
    /// Three flashes of 300 ms separated by 100 ms blanks.
    Triple300,
}

/// What the presentation layer should put on screen during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Stimulus,
    Blank,
}

/// One step of a presentation schedule.
///
/// `hold_ms` of `None` means the frame stays up until the subject responds;
/// after the final frame of a schedule the screen likewise stays as-is until
/// the response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub hold_ms: Option<u64>,
}

impl Frame {
    const fn stimulus(hold_ms: u64) -> Self {
        Self {
            kind: FrameKind::Stimulus,
            hold_ms: Some(hold_ms),
        }
    }

    const fn blank(hold_ms: u64) -> Self {
        Self {
            kind: FrameKind::Blank,
            hold_ms: Some(hold_ms),
        }
    }

    const fn until_response(kind: FrameKind) -> Self {
        Self { kind, hold_ms: None }
    }
}

impl PresentationMode {
    /// Every mode, in declaration order.
    pub const ALL: [PresentationMode; 3] = [
        PresentationMode::Continuous,
        PresentationMode::Single300,
        PresentationMode::Triple300,
    ];

    /// Resolves a mode from its external name.
    ///
    /// # Errors
    ///
    /// Returns `PresentationError::InvalidPresentation` for unknown names.
    pub fn from_name(name: &str) -> Result<Self, PresentationError> {
        match name {
            "continuous" => Ok(Self::Continuous),
            "single300" => Ok(Self::Single300),
            "triple300" => Ok(Self::Triple300),
            other => Err(PresentationError::InvalidPresentation(other.to_string())),
        }
    }

    /// The external name of this mode, as accepted by `from_name`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Single300 => "single300",
            Self::Triple300 => "triple300",
        }
    }

    /// The show/blank timing schedule for one trial.
    #[must_use]
    pub fn schedule(self) -> Vec<Frame> {
        match self {
            Self::Continuous => vec![Frame::until_response(FrameKind::Stimulus)],
            Self::Single300 => vec![
                Frame::blank(100),
                Frame::stimulus(200),
                Frame::until_response(FrameKind::Blank),
            ],
            Self::Triple300 => {
                let mut frames = Vec::with_capacity(6);
                for _ in 0..3 {
                    frames.push(Frame::stimulus(300));
                    frames.push(Frame::blank(100));
                }
                frames
            }
        }
    }
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

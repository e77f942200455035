//! Structured status for engine operations.
//!
//! Rejections are non-fatal: the requested change is simply not made and
//! state is left exactly as it was.

use thiserror::Error;

/// Why a requested change was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No video is selected")]
    NoActiveVideo,
    #[error("No frame time is resolved")]
    NoActiveBucket,
    #[error("Pause the video to annotate")]
    PlaybackActive,
    #[error("Frames are still loading. Please wait for the video to become ready.")]
    PlaybackNotReady,
    #[error("Shape not found in the current frame")]
    UnknownShape,
    #[error("Shape is too small to keep")]
    BelowThreshold,
    #[error("Sublabels can only be set on a dirty frame")]
    SublabelsRequireDirty,
    #[error("Unknown sublabel: {0}")]
    UnknownSublabel(String),
    #[error("A save is already in progress")]
    ExportInFlight,
}

impl Rejection {
    /// Rejections that must be shown to the user as a blocking message.
    /// Everything else is a silent no-op.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Rejection::PlaybackNotReady | Rejection::ExportInFlight | Rejection::NoActiveVideo
        )
    }
}

/// Result of a mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// State changed.
    Applied,
    /// Request was valid but there was nothing to change.
    Unchanged,
    /// Request was refused; state untouched.
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<Rejection> for Outcome {
    fn from(reason: Rejection) -> Self {
        log::debug!("Rejected: {}", reason);
        Outcome::Rejected(reason)
    }
}

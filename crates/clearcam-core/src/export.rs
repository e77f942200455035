//! Save/export bookkeeping.
//!
//! An export captures the frame identity when it starts. When it resolves,
//! the identity is compared with the current one and stale results are
//! dropped. Only one export may be in flight.

use crate::collab::{PlaybackError, UploadError, UploadReceipt};
use crate::outcome::Rejection;
use crate::session::VideoId;
use crate::shapes::Shape;
use crate::time_sync::TimeBucket;
use kurbo::Size;
use thiserror::Error;

/// Identity of the frame an export was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIdentity {
    pub video: VideoId,
    pub bucket: TimeBucket,
    /// Frame generation from the time sync; changes on every bucket or video
    /// switch, so returning to the same bucket still counts as a change.
    pub generation: u64,
}

/// Handle for one in-flight export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTicket {
    pub id: u64,
    pub frame: FrameIdentity,
    pub time: f64,
}

/// Everything the export pipeline needs, captured at save time.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub ticket: ExportTicket,
    pub video_name: String,
    /// Shapes in display-canvas coordinates, in paint order.
    pub shapes: Vec<Shape>,
    pub display_size: Size,
    pub native_size: (u32, u32),
}

/// Errors from the export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("Compositing failed: {0}")]
    Compose(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// User-visible state of the last save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportStatus {
    #[default]
    Idle,
    Saving,
    /// Uploaded; `location` is where the image went.
    Saved { location: String },
    /// Recorded locally but the upload failed.
    SavedLocally { warning: String },
    Failed { message: String },
}

impl ExportStatus {
    pub fn message(&self) -> Option<String> {
        match self {
            ExportStatus::Idle => None,
            ExportStatus::Saving => Some("Saving annotation...".to_string()),
            ExportStatus::Saved { location } => Some(format!("Saved to {location}")),
            ExportStatus::SavedLocally { warning } => {
                Some(format!("Annotation saved locally, but upload failed: {warning}"))
            }
            ExportStatus::Failed { message } => Some(message.clone()),
        }
    }
}

/// What happened to a resolved export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportResolution {
    Applied(ExportStatus),
    /// The frame changed while the export was pending; the result was dropped.
    Stale,
    /// The ticket does not belong to the in-flight export.
    Unknown,
}

/// Tracks the single in-flight export.
#[derive(Debug, Clone, Default)]
pub struct ExportTracker {
    next_id: u64,
    in_flight: Option<ExportTicket>,
    status: ExportStatus,
}

impl ExportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ExportStatus {
        &self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&ExportTicket> {
        self.in_flight.as_ref()
    }

    /// Start an export for `frame` at `time`.
    pub fn begin(&mut self, frame: FrameIdentity, time: f64) -> Result<ExportTicket, Rejection> {
        if self.in_flight.is_some() {
            return Err(Rejection::ExportInFlight);
        }
        self.next_id += 1;
        let ticket = ExportTicket {
            id: self.next_id,
            frame,
            time,
        };
        self.in_flight = Some(ticket.clone());
        self.status = ExportStatus::Saving;
        Ok(ticket)
    }

    /// Resolve the in-flight export. `current` is the frame identity now, or
    /// `None` when no frame is active.
    pub fn finish(
        &mut self,
        ticket: &ExportTicket,
        current: Option<&FrameIdentity>,
        result: Result<UploadReceipt, ExportError>,
    ) -> ExportResolution {
        if self.in_flight.as_ref().map(|t| t.id) != Some(ticket.id) {
            return ExportResolution::Unknown;
        }
        self.in_flight = None;

        if current != Some(&ticket.frame) {
            log::warn!(
                "Discarding export for {} at {:.2}s: frame changed",
                ticket.frame.video,
                ticket.time
            );
            self.status = ExportStatus::Idle;
            return ExportResolution::Stale;
        }

        self.status = match result {
            Ok(receipt) => {
                log::info!("Exported frame to {}", receipt.location());
                ExportStatus::Saved {
                    location: receipt.location(),
                }
            }
            Err(ExportError::Upload(error)) => {
                log::warn!("Upload failed, annotation kept locally: {}", error);
                ExportStatus::SavedLocally {
                    warning: error.to_string(),
                }
            }
            Err(error) => {
                log::error!("Export failed: {}", error);
                ExportStatus::Failed {
                    message: error.to_string(),
                }
            }
        };
        ExportResolution::Applied(self.status.clone())
    }

    /// Forget the last status message.
    pub fn dismiss(&mut self) {
        if self.in_flight.is_none() {
            self.status = ExportStatus::Idle;
        }
    }
}

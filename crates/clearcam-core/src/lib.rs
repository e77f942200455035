//! ClearCam Core Library
//!
//! Platform-agnostic annotation engine for labeling video frames: geometry,
//! per-second annotation buckets, the drawing state machine, playback time
//! sync and save bookkeeping.

pub mod camera;
pub mod collab;
pub mod config;
pub mod export;
pub mod hit;
pub mod input;
pub mod labels;
pub mod outcome;
pub mod saved;
pub mod session;
pub mod shapes;
pub mod sizing;
pub mod store;
pub mod time_sync;
pub mod tools;
pub mod workspace;

pub use camera::{Camera, to_content, to_screen};
pub use collab::{
    DecodedFrame, DirectoryUploader, FrameSource, FrameUploader, MemoryUploader, PlaybackError,
    StillFrameSource, UploadError, UploadReceipt, UploadRequest,
};
pub use config::{ConfigError, EngineConfig};
pub use export::{ExportError, ExportJob, ExportResolution, ExportStatus, ExportTicket};
pub use hit::hit_test;
pub use input::{Intent, Key, Modifiers, MouseButton};
pub use labels::{LabelSelection, PrimaryLabel};
pub use outcome::{Outcome, Rejection};
pub use saved::{SavedAnnotationRecord, SavedAnnotations, format_time};
pub use session::{VideoId, VideoSession, VideoSource};
pub use shapes::{Shape, ShapeColor, ShapeId, ShapeKind, ShapePatch};
pub use sizing::{DisplayBounds, compute_display_size};
pub use store::{AnnotationBucket, AnnotationStore};
pub use time_sync::{PlaybackStatus, TimeBucket, VideoMetadata, VideoTimeSync, bucket_for};
pub use tools::{DrawState, DrawingStateMachine, ToolKind};
pub use workspace::Workspace;

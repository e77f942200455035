//! Authoritative per-frame annotation state.
//!
//! Annotations are keyed by video and whole-second bucket. Each mutation
//! replaces one bucket's shape list or label field in a single step, after
//! all validation has passed, so a rejected request never leaves a bucket
//! half-updated.

use crate::labels::{LabelSelection, PrimaryLabel};
use crate::outcome::{Outcome, Rejection};
use crate::session::{VideoId, VideoSession};
use crate::shapes::{Shape, ShapeId, ShapePatch};
use crate::time_sync::{bucket_for, EditScope, TimeBucket};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Shapes and labels for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationBucket {
    /// Insertion order; also hit-test and paint order.
    pub shapes: Vec<Shape>,
    pub label_selection: Option<LabelSelection>,
}

impl AnnotationBucket {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.label_selection.is_none()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.iter().any(|shape| shape.id() == id)
    }
}

/// Serialized form of every bucket of one video.
#[derive(Debug, Serialize)]
struct VideoAnnotations<'a> {
    video: &'a VideoId,
    buckets: &'a BTreeMap<TimeBucket, AnnotationBucket>,
}

/// In-memory annotation store for the active video.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    active_video: Option<VideoId>,
    videos: HashMap<VideoId, BTreeMap<TimeBucket, AnnotationBucket>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_video(&self) -> Option<&VideoId> {
        self.active_video.as_ref()
    }

    /// Make `video` the active video. Annotations of any other video are
    /// discarded; they are never carried across videos.
    pub fn open_video(&mut self, video: VideoId) {
        if self.active_video.as_ref() != Some(&video) {
            log::info!("Opening annotations for {}", video);
            self.videos.clear();
        }
        self.videos.entry(video.clone()).or_default();
        self.active_video = Some(video);
    }

    /// Drop everything.
    pub fn close(&mut self) {
        self.active_video = None;
        self.videos.clear();
    }

    /// Resolve the bucket a mutation applies to.
    fn target(&self, scope: EditScope) -> Result<(VideoId, TimeBucket), Rejection> {
        if scope.playing {
            return Err(Rejection::PlaybackActive);
        }
        let video = self.active_video.clone().ok_or(Rejection::NoActiveVideo)?;
        let bucket = scope.bucket.ok_or(Rejection::NoActiveBucket)?;
        Ok((video, bucket))
    }

    fn bucket_mut(&mut self, video: VideoId, bucket: TimeBucket) -> &mut AnnotationBucket {
        self.videos.entry(video).or_default().entry(bucket).or_default()
    }

    /// Append a shape to the current bucket.
    pub fn add_shape(&mut self, scope: EditScope, shape: Shape) -> Outcome {
        let (video, bucket) = match self.target(scope) {
            Ok(target) => target,
            Err(reason) => return reason.into(),
        };
        if !shape.has_positive_extent() {
            return Rejection::BelowThreshold.into();
        }
        let entry = self.bucket_mut(video, bucket);
        if entry.contains(shape.id()) {
            return Outcome::Unchanged;
        }
        entry.shapes.push(shape);
        Outcome::Applied
    }

    /// Replace fields of a shape in the current bucket.
    pub fn update_shape(&mut self, scope: EditScope, id: ShapeId, patch: &ShapePatch) -> Outcome {
        let (video, bucket) = match self.target(scope) {
            Ok(target) => target,
            Err(reason) => return reason.into(),
        };
        let Some(entry) = self.videos.get_mut(&video).and_then(|b| b.get_mut(&bucket)) else {
            return Rejection::UnknownShape.into();
        };
        let Some(pos) = entry.shapes.iter().position(|shape| shape.id() == id) else {
            return Rejection::UnknownShape.into();
        };
        let updated = entry.shapes[pos].patched(patch);
        if !updated.has_positive_extent() {
            return Rejection::BelowThreshold.into();
        }
        if updated == entry.shapes[pos] {
            return Outcome::Unchanged;
        }
        entry.shapes[pos] = updated;
        Outcome::Applied
    }

    /// Remove a shape from the current bucket, clearing the session's
    /// selection if it pointed at it.
    pub fn delete_shape(&mut self, scope: EditScope, session: &mut VideoSession, id: ShapeId) -> Outcome {
        let (video, bucket) = match self.target(scope) {
            Ok(target) => target,
            Err(reason) => return reason.into(),
        };
        let Some(entry) = self.videos.get_mut(&video).and_then(|b| b.get_mut(&bucket)) else {
            return Rejection::UnknownShape.into();
        };
        let before = entry.shapes.len();
        entry.shapes.retain(|shape| shape.id() != id);
        if entry.shapes.len() == before {
            return Rejection::UnknownShape.into();
        }
        if session.selected_shape() == Some(id) {
            session.clear_selection();
        }
        Outcome::Applied
    }

    /// Set the current bucket's label selection.
    pub fn set_label(&mut self, scope: EditScope, primary: PrimaryLabel, sublabels: Vec<String>) -> Outcome {
        let (video, bucket) = match self.target(scope) {
            Ok(target) => target,
            Err(reason) => return reason.into(),
        };
        let selection = match LabelSelection::new(primary, sublabels) {
            Ok(selection) => selection,
            Err(reason) => return reason.into(),
        };
        let entry = self.bucket_mut(video, bucket);
        if entry.label_selection.as_ref() == Some(&selection) {
            return Outcome::Unchanged;
        }
        entry.label_selection = Some(selection);
        Outcome::Applied
    }

    /// Toggle one sublabel on the current bucket. Turning a sublabel on
    /// forces the primary label to dirty.
    pub fn toggle_sublabel(&mut self, scope: EditScope, name: &str) -> Outcome {
        let (video, bucket) = match self.target(scope) {
            Ok(target) => target,
            Err(reason) => return reason.into(),
        };
        let entry = self.bucket_mut(video, bucket);
        let mut selection = entry.label_selection.clone().unwrap_or_default();
        selection.toggle_sublabel(name);
        entry.label_selection = Some(selection);
        Outcome::Applied
    }

    /// Remove the current bucket's label selection.
    pub fn clear_label(&mut self, scope: EditScope) -> Outcome {
        let (video, bucket) = match self.target(scope) {
            Ok(target) => target,
            Err(reason) => return reason.into(),
        };
        match self.videos.get_mut(&video).and_then(|b| b.get_mut(&bucket)) {
            Some(entry) if entry.label_selection.is_some() => {
                entry.label_selection = None;
                Outcome::Applied
            }
            _ => Outcome::Unchanged,
        }
    }

    pub fn bucket(&self, video: &VideoId, bucket: TimeBucket) -> Option<&AnnotationBucket> {
        self.videos.get(video).and_then(|b| b.get(&bucket))
    }

    /// Shapes of the bucket containing `time`, in insertion order.
    pub fn shapes_for_bucket(&self, video: &VideoId, time: f64) -> &[Shape] {
        bucket_for(time)
            .and_then(|bucket| self.bucket(video, bucket))
            .map(|entry| entry.shapes.as_slice())
            .unwrap_or(&[])
    }

    /// Label selection of the bucket containing `time`.
    pub fn label_selection(&self, video: &VideoId, time: f64) -> Option<&LabelSelection> {
        bucket_for(time)
            .and_then(|bucket| self.bucket(video, bucket))
            .and_then(|entry| entry.label_selection.as_ref())
    }

    /// Buckets of `video` that carry shapes or a label, in time order.
    pub fn annotated_buckets(&self, video: &VideoId) -> Vec<TimeBucket> {
        self.videos
            .get(video)
            .map(|buckets| {
                buckets
                    .iter()
                    .filter(|(_, entry)| !entry.is_empty())
                    .map(|(bucket, _)| *bucket)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serialize every bucket of `video` to JSON.
    pub fn export_video_json(&self, video: &VideoId) -> Result<String, serde_json::Error> {
        let empty = BTreeMap::new();
        let buckets = self.videos.get(video).unwrap_or(&empty);
        serde_json::to_string_pretty(&VideoAnnotations { video, buckets })
    }
}

//! The coordinator that owns all engine state.
//!
//! Events from the host (pointer, keyboard, playback) are handled one at a
//! time to completion. Each call reads the current video, bucket and tool,
//! routes the event to the right component and applies the result to the
//! store.

use crate::collab::UploadReceipt;
use crate::config::EngineConfig;
use crate::export::{
    ExportError, ExportJob, ExportResolution, ExportStatus, ExportTicket, ExportTracker, FrameIdentity,
};
use crate::input::Intent;
use crate::labels::{LabelSelection, PrimaryLabel};
use crate::outcome::{Outcome, Rejection};
use crate::saved::{RecordChange, SavedAnnotationRecord, SavedAnnotations};
use crate::session::{VideoId, VideoSession, VideoSource};
use crate::shapes::{Shape, ShapeId, ShapePatch};
use crate::sizing::{DisplayBounds, compute_display_size};
use crate::store::AnnotationStore;
use crate::time_sync::{PlaybackStatus, TimeUpdate, VideoMetadata, VideoTimeSync, capture_times};
use crate::tools::{DrawContext, DrawState, DrawingStateMachine, Effect, ToolKind};
use kurbo::Size;

/// Annotation engine state for one user.
#[derive(Debug, Clone)]
pub struct Workspace {
    config: EngineConfig,
    session: VideoSession,
    store: AnnotationStore,
    time: VideoTimeSync,
    drawing: DrawingStateMachine,
    saved: SavedAnnotations,
    exports: ExportTracker,
    display_size: Size,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Workspace {
    pub fn new(config: EngineConfig) -> Self {
        let display_size = compute_display_size(0, 0, &DisplayBounds::from_config(&config));
        Self {
            session: VideoSession::new(&config),
            saved: SavedAnnotations::with_tolerance(config.saved_time_tolerance),
            store: AnnotationStore::new(),
            time: VideoTimeSync::new(),
            drawing: DrawingStateMachine::new(),
            exports: ExportTracker::new(),
            display_size,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &VideoSession {
        &self.session
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn time(&self) -> &VideoTimeSync {
        &self.time
    }

    pub fn drawing_state(&self) -> &DrawState {
        self.drawing.state()
    }

    pub fn saved(&self) -> &SavedAnnotations {
        &self.saved
    }

    pub fn export_status(&self) -> &ExportStatus {
        self.exports.status()
    }

    pub fn is_exporting(&self) -> bool {
        self.exports.is_in_flight()
    }

    /// Size of the on-screen content canvas.
    pub fn display_size(&self) -> Size {
        self.display_size
    }

    /// Override the display canvas size, e.g. when the host lays the canvas
    /// out differently. Ignored unless both axes are positive.
    pub fn set_display_size(&mut self, size: Size) {
        if size.width > 0.0 && size.height > 0.0 {
            self.display_size = size;
        }
    }

    // --- Video lifecycle ---

    /// Switch to another video. Everything tied to the previous one is
    /// dropped. Selecting the current video again is a no-op.
    pub fn select_video(&mut self, source: VideoSource) -> Outcome {
        if self.session.source() == Some(&source) {
            return Outcome::Unchanged;
        }
        log::info!("Selected video {} ({})", source.name, source.location);
        self.store.open_video(source.id());
        self.session.open(source);
        self.time.reset_for_video();
        self.drawing.set_state(DrawState::Idle);
        self.saved.clear();
        self.display_size = compute_display_size(0, 0, &self.display_bounds());
        Outcome::Applied
    }

    pub fn close_video(&mut self) {
        self.session.close();
        self.store.close();
        self.time.reset_for_video();
        self.drawing.set_state(DrawState::Idle);
        self.saved.clear();
    }

    fn display_bounds(&self) -> DisplayBounds {
        DisplayBounds::from_config(&self.config)
    }

    // --- Playback events ---

    pub fn on_metadata(&mut self, metadata: VideoMetadata) {
        self.time.on_metadata(metadata);
        self.display_size = compute_display_size(metadata.width, metadata.height, &self.display_bounds());
        log::debug!(
            "Video ready: {:.1}s at {}x{}, canvas {:.0}x{:.0}",
            metadata.duration,
            metadata.width,
            metadata.height,
            self.display_size.width,
            self.display_size.height
        );
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        self.time.on_error(message);
        self.drawing.abort();
    }

    pub fn on_play(&mut self) {
        self.time.on_play();
        self.drawing.abort();
    }

    pub fn on_pause(&mut self) {
        self.time.on_pause();
    }

    pub fn on_time_update(&mut self, time: f64) -> TimeUpdate {
        let update = self.time.on_time_update(time);
        self.after_time_change(update);
        update
    }

    /// Seek to a user-chosen time.
    pub fn seek(&mut self, time: f64) -> TimeUpdate {
        let update = self.time.seek(time);
        self.after_time_change(update);
        update
    }

    pub fn apply_status(&mut self, status: PlaybackStatus) -> TimeUpdate {
        let had_metadata = self.time.metadata().is_some();
        let update = self.time.apply_status(status);
        if !had_metadata {
            if let Some(metadata) = self.time.metadata() {
                self.display_size =
                    compute_display_size(metadata.width, metadata.height, &self.display_bounds());
            }
        }
        self.after_time_change(update);
        update
    }

    fn after_time_change(&mut self, update: TimeUpdate) {
        if update.abort_drawing {
            self.drawing.abort();
        }
        if update.bucket_changed {
            self.session.clear_selection();
            if matches!(self.drawing.state(), DrawState::ShapeSelected { .. }) {
                self.drawing.set_state(DrawState::Idle);
            }
        }
    }

    /// Thumbnail capture times for the current video.
    pub fn capture_times(&self) -> Vec<f64> {
        capture_times(self.time.duration(), self.config.frame_interval)
    }

    // --- View and tools ---

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.session.active_tool != tool {
            self.drawing.abort();
            self.session.active_tool = tool;
        }
    }

    pub fn zoom_in(&mut self) {
        self.session.camera.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.session.camera.zoom_out();
    }

    pub fn zoom_reset(&mut self) {
        self.session.camera.reset_zoom();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.session.camera.set_zoom(zoom);
    }

    /// Change the overlay opacity. A selected shape takes the new value too.
    pub fn set_overlay_opacity(&mut self, opacity: u8) -> Outcome {
        self.session.set_overlay_opacity(opacity);
        match self.selected_shape().map(Shape::id) {
            Some(id) => {
                let patch = ShapePatch::opacity(self.session.overlay_opacity());
                self.store.update_shape(self.time.scope(), id, &patch)
            }
            None => Outcome::Applied,
        }
    }

    // --- Canvas ---

    /// Committed shapes of the current bucket, in paint order.
    pub fn current_shapes(&self) -> &[Shape] {
        match self.session.video_id() {
            Some(video) => self.store.shapes_for_bucket(&video, self.time.current_time()),
            None => &[],
        }
    }

    /// Shapes to render: the committed ones plus the one being drawn.
    pub fn visible_shapes(&self) -> Vec<Shape> {
        let mut shapes = self.current_shapes().to_vec();
        shapes.extend(self.drawing.transient_shape().cloned());
        shapes
    }

    /// The selected shape, if it still exists in the current bucket.
    pub fn selected_shape(&self) -> Option<&Shape> {
        let shapes = self.current_shapes();
        let id = self.session.selection_in(shapes)?;
        shapes.iter().find(|shape| shape.id() == id)
    }

    fn can_annotate(&self) -> Result<(), Rejection> {
        if self.session.source().is_none() {
            return Err(Rejection::NoActiveVideo);
        }
        if !self.time.is_ready() {
            return Err(Rejection::PlaybackNotReady);
        }
        if self.time.is_playing() {
            return Err(Rejection::PlaybackActive);
        }
        Ok(())
    }

    /// Feed one input event through the drawing state machine and apply
    /// whatever it produces.
    pub fn dispatch(&mut self, intent: &Intent) -> Outcome {
        let readiness = self.can_annotate();
        if intent.is_primary_down() && self.session.active_tool != ToolKind::Pan {
            if let Err(reason) = readiness.clone() {
                return reason.into();
            }
        }

        let effect = {
            let shapes = match self.session.video_id() {
                Some(video) => self.store.shapes_for_bucket(&video, self.time.current_time()),
                None => &[],
            };
            let ctx = DrawContext {
                tool: self.session.active_tool,
                camera: &self.session.camera,
                shapes,
                selected: self.session.selection_in(shapes),
                opacity: self.session.overlay_opacity(),
                color: self.config.shape_color,
                can_annotate: readiness.is_ok(),
                min_extent: self.config.min_shape_extent,
            };
            self.drawing.handle(intent, &ctx)
        };

        match effect {
            None => Outcome::Unchanged,
            Some(effect) => self.apply_effect(effect),
        }
    }

    fn apply_effect(&mut self, effect: Effect) -> Outcome {
        let scope = self.time.scope();
        match effect {
            Effect::Pan(delta) => {
                self.session.camera.pan(delta);
                Outcome::Applied
            }
            Effect::Select(id) => {
                self.session.select(id);
                Outcome::Applied
            }
            Effect::Commit(shape) => {
                let id = shape.id();
                let outcome = self.store.add_shape(scope, shape);
                if outcome.is_applied() {
                    self.session.select(id);
                } else {
                    self.drawing.set_state(DrawState::Idle);
                }
                outcome
            }
            Effect::Delete(id) => {
                let outcome = self.store.delete_shape(scope, &mut self.session, id);
                if !outcome.is_applied() && self.session.selected_shape() == Some(id) {
                    self.drawing.set_state(DrawState::ShapeSelected { id });
                }
                outcome
            }
        }
    }

    /// Delete the selected shape.
    pub fn delete_selected(&mut self) -> Outcome {
        match self.selected_shape().map(Shape::id) {
            Some(id) => self.delete_shape(id),
            None => Outcome::Unchanged,
        }
    }

    pub fn delete_shape(&mut self, id: ShapeId) -> Outcome {
        let outcome = self.store.delete_shape(self.time.scope(), &mut self.session, id);
        if outcome.is_applied() && self.drawing.state() == &(DrawState::ShapeSelected { id }) {
            self.drawing.set_state(DrawState::Idle);
        }
        outcome
    }

    /// Add a shape that was not drawn through [`Workspace::dispatch`], e.g.
    /// one loaded from disk. Display-canvas coordinates.
    pub fn add_shape(&mut self, shape: Shape) -> Outcome {
        self.store.add_shape(self.time.scope(), shape)
    }

    pub fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> Outcome {
        self.store.update_shape(self.time.scope(), id, patch)
    }

    // --- Labels ---

    pub fn label_selection(&self) -> Option<&LabelSelection> {
        let video = self.session.video_id()?;
        self.store.label_selection(&video, self.time.current_time())
    }

    /// Sublabels outside the configured taxonomy are rejected.
    pub fn set_label(&mut self, primary: PrimaryLabel, sublabels: Vec<String>) -> Outcome {
        if let Some(unknown) = sublabels.iter().find(|name| !self.is_known_sublabel(name)) {
            return Rejection::UnknownSublabel(unknown.clone()).into();
        }
        self.store.set_label(self.time.scope(), primary, sublabels)
    }

    pub fn toggle_sublabel(&mut self, name: &str) -> Outcome {
        if !self.is_known_sublabel(name) {
            return Rejection::UnknownSublabel(name.to_string()).into();
        }
        self.store.toggle_sublabel(self.time.scope(), name)
    }

    fn is_known_sublabel(&self, name: &str) -> bool {
        self.config.sublabels.iter().any(|known| known == name)
    }

    pub fn clear_label(&mut self) -> Outcome {
        self.store.clear_label(self.time.scope())
    }

    // --- Saving ---

    fn frame_identity(&self) -> Option<FrameIdentity> {
        Some(FrameIdentity {
            video: self.session.video_id()?,
            bucket: self.time.current_bucket()?,
            generation: self.time.generation(),
        })
    }

    /// Start saving the current frame.
    ///
    /// The saved-annotation record is written immediately, before any
    /// compositing or upload, so it survives a failed upload. A frame
    /// without a label is recorded as clean.
    pub fn begin_save(&mut self) -> Result<ExportJob, Rejection> {
        self.can_annotate()?;
        let frame = self.frame_identity().ok_or(Rejection::NoActiveBucket)?;
        let video_name = self
            .session
            .source()
            .map(|source| source.name.clone())
            .ok_or(Rejection::NoActiveVideo)?;
        let native_size = self.time.native_size().ok_or(Rejection::PlaybackNotReady)?;

        let time = self.time.current_time();
        let ticket = self.exports.begin(frame, time)?;

        let selection = self.label_selection().cloned().unwrap_or_else(LabelSelection::clean);
        let change = self.saved.record(SavedAnnotationRecord::new(time, &selection));
        log::info!(
            "Recorded {} annotation at {:.2}s ({:?})",
            selection.primary_label,
            time,
            change
        );

        Ok(ExportJob {
            ticket,
            video_name,
            shapes: self.current_shapes().to_vec(),
            display_size: self.display_size,
            native_size,
        })
    }

    /// Apply the result of an export started by [`Workspace::begin_save`].
    pub fn finish_save(
        &mut self,
        ticket: &ExportTicket,
        result: Result<UploadReceipt, ExportError>,
    ) -> ExportResolution {
        let current = self.frame_identity();
        self.exports.finish(ticket, current.as_ref(), result)
    }

    pub fn dismiss_export_status(&mut self) {
        self.exports.dismiss();
    }

    /// JSON dump of the active video's buckets.
    pub fn export_video_json(&self) -> Option<Result<String, serde_json::Error>> {
        let video: VideoId = self.session.video_id()?;
        Some(self.store.export_video_json(&video))
    }

    /// Record a save directly. Used when restoring saved annotations.
    pub fn restore_saved(&mut self, record: SavedAnnotationRecord) -> RecordChange {
        self.saved.record(record)
    }
}

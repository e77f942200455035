//! The active video and its view state.

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::shapes::{Shape, ShapeId, MAX_OPACITY};
use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a video within the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Where a video came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Display name; also the video's identity.
    pub name: String,
    /// Source descriptor (bucket, URL or local path).
    pub location: String,
}

impl VideoSource {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    pub fn id(&self) -> VideoId {
        VideoId::new(self.name.clone())
    }
}

/// View and tool state for the video being annotated.
///
/// The selection is a weak reference: an id that is checked against the
/// current bucket whenever it is read.
#[derive(Debug, Clone)]
pub struct VideoSession {
    source: Option<VideoSource>,
    pub camera: Camera,
    pub active_tool: ToolKind,
    selected_shape: Option<ShapeId>,
    overlay_opacity: u8,
}

impl Default for VideoSession {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl VideoSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            source: None,
            camera: Camera::from_config(config),
            active_tool: ToolKind::default(),
            selected_shape: None,
            overlay_opacity: config.default_opacity.min(MAX_OPACITY),
        }
    }

    pub fn source(&self) -> Option<&VideoSource> {
        self.source.as_ref()
    }

    pub fn video_id(&self) -> Option<VideoId> {
        self.source.as_ref().map(VideoSource::id)
    }

    /// Replace the active video. Selection and view are reset.
    pub fn open(&mut self, source: VideoSource) {
        self.source = Some(source);
        self.selected_shape = None;
        self.camera.reset();
    }

    pub fn close(&mut self) {
        self.source = None;
        self.selected_shape = None;
    }

    /// Zoom percentage.
    pub fn zoom(&self) -> f64 {
        self.camera.zoom()
    }

    pub fn overlay_opacity(&self) -> u8 {
        self.overlay_opacity
    }

    pub fn set_overlay_opacity(&mut self, opacity: u8) {
        self.overlay_opacity = opacity.min(MAX_OPACITY);
    }

    /// The raw selected id, without an existence check.
    pub fn selected_shape(&self) -> Option<ShapeId> {
        self.selected_shape
    }

    /// The selected id if it still names a shape in `shapes`.
    pub fn selection_in(&self, shapes: &[Shape]) -> Option<ShapeId> {
        self.selected_shape
            .filter(|id| shapes.iter().any(|shape| shape.id() == *id))
    }

    pub fn select(&mut self, id: ShapeId) {
        self.selected_shape = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_shape = None;
    }

    /// Drop the selection if it no longer names a shape in `shapes`.
    pub fn prune_selection(&mut self, shapes: &[Shape]) {
        self.selected_shape = self.selection_in(shapes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ShapeColor, ShapeKind};
    use kurbo::{Point, Vec2};

    #[test]
    fn test_open_resets_view_and_selection() {
        let mut session = VideoSession::default();
        session.camera.pan(Vec2::new(5.0, 5.0));
        session.camera.set_zoom(300.0);
        session.select(ShapeId::new_v4());

        session.open(VideoSource::new("JA_2.mp4", "local"));
        assert_eq!(session.video_id(), Some(VideoId::from("JA_2.mp4")));
        assert_eq!(session.selected_shape(), None);
        assert_eq!(session.camera.offset, Vec2::ZERO);
        assert!((session.zoom() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selection_is_weak() {
        let mut session = VideoSession::default();
        let shape = Shape::new(ShapeKind::Circle, Point::ZERO, 10.0, 60, ShapeColor::default());
        session.select(shape.id());
        assert_eq!(session.selection_in(std::slice::from_ref(&shape)), Some(shape.id()));
        assert_eq!(session.selection_in(&[]), None);

        session.prune_selection(&[]);
        assert_eq!(session.selected_shape(), None);
    }

    #[test]
    fn test_overlay_opacity_clamped() {
        let mut session = VideoSession::default();
        assert_eq!(session.overlay_opacity(), 60);
        session.set_overlay_opacity(140);
        assert_eq!(session.overlay_opacity(), 100);
    }
}

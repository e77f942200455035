//! Camera module for pan/zoom transforms.
//!
//! Screen space is the pointer position relative to the canvas container.
//! Content space is the unzoomed, unpanned canvas the shapes live in:
//! `content = (screen - pan) / (zoom / 100)`.

use crate::config::EngineConfig;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom percentage that corresponds to "100%" in the UI.
pub const DEFAULT_ZOOM: f64 = 100.0;
/// Lowest zoom percentage the UI allows.
pub const MIN_ZOOM: f64 = 25.0;
/// Highest zoom percentage the UI allows.
pub const MAX_ZOOM: f64 = 500.0;
/// Increment used by the zoom in/out buttons.
pub const ZOOM_STEP: f64 = 25.0;

/// Convert a screen point to content space.
///
/// Returns `None` when `zoom_percent` is not a positive finite number.
pub fn to_content(screen: Point, pan: Vec2, zoom_percent: f64) -> Option<Point> {
    Camera::unclamped(pan, zoom_percent).map(|camera| camera.screen_to_content(screen))
}

/// Convert a content point to screen space. Exact inverse of [`to_content`].
pub fn to_screen(content: Point, pan: Vec2, zoom_percent: f64) -> Option<Point> {
    Camera::unclamped(pan, zoom_percent).map(|camera| camera.content_to_screen(content))
}

/// Camera manages the view transform for the frame canvas.
///
/// The pan offset is in screen pixels and the zoom is a percentage kept
/// inside `[min_zoom, max_zoom]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan) in screen pixels.
    pub offset: Vec2,
    /// Current zoom percentage.
    zoom: f64,
    /// Minimum allowed zoom percentage.
    pub min_zoom: f64,
    /// Maximum allowed zoom percentage.
    pub max_zoom: f64,
    /// Step used by [`Camera::zoom_in`] and [`Camera::zoom_out`].
    pub zoom_step: f64,
    /// Zoom restored by [`Camera::reset_zoom`].
    pub default_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            default_zoom: DEFAULT_ZOOM,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera using the zoom bounds from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: config.default_zoom,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
            default_zoom: config.default_zoom,
        }
    }

    /// Camera with an arbitrary positive zoom, bypassing the UI bounds.
    fn unclamped(offset: Vec2, zoom: f64) -> Option<Self> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return None;
        }
        Some(Self {
            offset,
            zoom,
            ..Self::default()
        })
    }

    /// Current zoom percentage.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Zoom as a plain scale factor (100% = 1.0).
    pub fn scale(&self) -> f64 {
        self.zoom / 100.0
    }

    /// Set the zoom percentage, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Increase zoom by one step.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_step);
    }

    /// Decrease zoom by one step.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_step);
    }

    /// Get the affine transform for rendering (content to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale())
    }

    /// Get the inverse transform for input handling (screen to content).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to content coordinates.
    pub fn screen_to_content(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a content point to screen coordinates.
    pub fn content_to_screen(&self, content_point: Point) -> Point {
        self.transform() * content_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Reset zoom to the default. The pan offset is left alone.
    pub fn reset_zoom(&mut self) {
        self.zoom = self.default_zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.reset_zoom();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.zoom() - DEFAULT_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_content_identity() {
        let camera = Camera::new();
        let screen = Point::new(100.0, 200.0);
        let content = camera.screen_to_content(screen);
        assert!((content.x - screen.x).abs() < f64::EPSILON);
        assert!((content.y - screen.y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_content_with_offset_and_zoom() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        camera.set_zoom(200.0);
        let content = camera.screen_to_content(Point::new(150.0, 300.0));
        assert!((content.x - 50.0).abs() < 1e-12);
        assert!((content.y - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_free_functions_match_formula() {
        let pan = Vec2::new(-12.5, 40.0);
        let p = to_content(Point::new(87.5, 140.0), pan, 50.0).unwrap();
        assert!((p.x - 200.0).abs() < 1e-9);
        assert!((p.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_zoom_rejected() {
        assert!(to_content(Point::ZERO, Vec2::ZERO, 0.0).is_none());
        assert!(to_screen(Point::ZERO, Vec2::ZERO, -10.0).is_none());
        assert!(to_content(Point::ZERO, Vec2::ZERO, f64::NAN).is_none());
    }

    #[test]
    fn test_roundtrip_across_zoom_range() {
        let pans = [
            Vec2::ZERO,
            Vec2::new(30.0, -20.0),
            Vec2::new(-1234.5, 987.25),
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.0, 456.0),
            Point::new(-77.7, 1e4),
        ];
        let mut zoom = MIN_ZOOM;
        while zoom <= MAX_ZOOM {
            for pan in pans {
                for p in points {
                    let content = to_content(p, pan, zoom).unwrap();
                    let back = to_screen(content, pan, zoom).unwrap();
                    assert!((back.x - p.x).abs() < 1e-6, "x drift at zoom {zoom}");
                    assert!((back.y - p.y).abs() < 1e-6, "y drift at zoom {zoom}");
                }
            }
            zoom += 12.5;
        }
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.set_zoom(1.0);
        assert!((camera.zoom() - MIN_ZOOM).abs() < f64::EPSILON);

        camera.set_zoom(10_000.0);
        assert!((camera.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_steps() {
        let mut camera = Camera::new();
        camera.zoom_in();
        assert!((camera.zoom() - 125.0).abs() < f64::EPSILON);
        for _ in 0..10 {
            camera.zoom_out();
        }
        assert!((camera.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
        camera.reset_zoom();
        assert!((camera.zoom() - DEFAULT_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_uses_configured_default() {
        let config = EngineConfig {
            default_zoom: 150.0,
            ..EngineConfig::default()
        };
        let mut camera = Camera::from_config(&config);
        camera.zoom_in();
        camera.pan(Vec2::new(5.0, 5.0));
        camera.reset();
        assert!((camera.zoom() - 150.0).abs() < f64::EPSILON);
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        camera.pan(Vec2::new(-4.0, 1.0));
        assert!((camera.offset.x - 6.0).abs() < f64::EPSILON);
        assert!((camera.offset.y - 21.0).abs() < f64::EPSILON);
    }
}

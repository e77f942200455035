//! Compositor trait and shared render types.

use clearcam_core::collab::DecodedFrame;
use clearcam_core::camera::Camera;
use clearcam_core::shapes::{Shape, ShapeColor, ShapeKind};
use kurbo::{BezPath, Circle, Point, Rect, Shape as _, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Frame buffer does not match {width}x{height}")]
    FrameMismatch { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Image decoding failed: {0}")]
    Decode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Mapping from display-canvas coordinates to the native frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScale {
    pub x: f64,
    pub y: f64,
    /// Mean of both axes; applied to radii and edge lengths so shapes stay
    /// round and square.
    pub average: f64,
}

impl CompositeScale {
    /// Scale from `display` to `native`. A zero display axis maps 1:1.
    pub fn new(display: Size, native: (u32, u32)) -> Self {
        let axis = |native: u32, display: f64| {
            if display > 0.0 && display.is_finite() {
                f64::from(native) / display
            } else {
                1.0
            }
        };
        let x = axis(native.0, display.width);
        let y = axis(native.1, display.height);
        Self {
            x,
            y,
            average: (x + y) / 2.0,
        }
    }

    pub fn point(&self, p: Point) -> Point {
        Point::new(p.x * self.x, p.y * self.y)
    }

    pub fn length(&self, len: f64) -> f64 {
        len * self.average
    }
}

/// On-screen styling for the live canvas. Not used for exported frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub selection_color: Color,
    pub selection_width: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            selection_color: fill_color(ShapeColor::SELECTION, 100),
            selection_width: 3.0,
        }
    }
}

impl OverlayStyle {
    /// Outline to stroke around the selected shape, in screen space.
    pub fn selection_outline(&self, shape: &Shape, camera: &Camera) -> SelectionOutline {
        let center = shape.center();
        let extent = shape.extent();
        let path = match shape.kind() {
            ShapeKind::Circle => Circle::new(center, extent).to_path(0.1),
            ShapeKind::Square => Rect::from_center_size(center, Size::new(extent, extent)).to_path(0.1),
        };
        SelectionOutline {
            path: camera.transform() * path,
            color: self.selection_color,
            width: self.selection_width,
        }
    }
}

/// A stroked outline produced by [`OverlayStyle::selection_outline`].
#[derive(Debug, Clone)]
pub struct SelectionOutline {
    pub path: BezPath,
    pub color: Color,
    /// Stroke width in screen pixels.
    pub width: f64,
}

/// Fill color of a shape with its opacity percentage as alpha.
pub fn fill_color(color: ShapeColor, opacity: u8) -> Color {
    let alpha = (f32::from(opacity.min(100)) / 100.0 * 255.0).round() as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

/// Flattens annotation shapes onto a video frame.
pub trait FrameCompositor: Send + Sync {
    /// Draw `frame` at the origin of a `native_size` canvas, then `shapes`
    /// in order. Shape coordinates are in `display_size` space.
    fn compose(
        &self,
        frame: &DecodedFrame,
        shapes: &[Shape],
        display_size: Size,
        native_size: (u32, u32),
    ) -> RenderResult<DecodedFrame>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape as _;

    #[test]
    fn test_scale_factors() {
        let scale = CompositeScale::new(Size::new(800.0, 450.0), (1920, 1080));
        assert!((scale.x - 2.4).abs() < 1e-12);
        assert!((scale.y - 2.4).abs() < 1e-12);
        assert!((scale.length(20.0) - 48.0).abs() < 1e-9);
        let p = scale.point(Point::new(100.0, 50.0));
        assert!((p.x - 240.0).abs() < 1e-9 && (p.y - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_scale_for_mismatched_aspect() {
        let scale = CompositeScale::new(Size::new(100.0, 100.0), (200, 100));
        assert!((scale.average - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_display_falls_back() {
        let scale = CompositeScale::new(Size::ZERO, (1920, 1080));
        assert_eq!((scale.x, scale.y, scale.average), (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_selection_outline_in_screen_space() {
        let mut camera = Camera::new();
        camera.set_zoom(200.0);
        camera.offset = kurbo::Vec2::new(10.0, 0.0);
        let circle = Shape::new(
            ShapeKind::Circle,
            Point::new(100.0, 100.0),
            20.0,
            60,
            ShapeColor::CONTAMINATION,
        );

        let outline = OverlayStyle::default().selection_outline(&circle, &camera);
        let bounds = outline.path.bounding_box();
        assert!((bounds.x0 - 170.0).abs() < 1e-6 && (bounds.x1 - 250.0).abs() < 1e-6);
        assert!((bounds.y0 - 160.0).abs() < 1e-6 && (bounds.y1 - 240.0).abs() < 1e-6);
        let rgba = outline.color.to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (0x3b, 0x82, 0xf6, 255));
        assert_eq!(outline.width, 3.0);

        let square = Shape::new(
            ShapeKind::Square,
            Point::new(50.0, 50.0),
            10.0,
            60,
            ShapeColor::CONTAMINATION,
        );
        let bounds = OverlayStyle::default()
            .selection_outline(&square, &Camera::new())
            .path
            .bounding_box();
        assert_eq!(bounds, Rect::new(45.0, 45.0, 55.0, 55.0));
    }

    #[test]
    fn test_fill_color_alpha() {
        let rgba = fill_color(ShapeColor::CONTAMINATION, 60).to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (0xef, 0x44, 0x44, 153));
    }
}

//! CPU raster compositor for exported frames.

use crate::renderer::{CompositeScale, FrameCompositor, RenderError, RenderResult, fill_color};
use clearcam_core::collab::DecodedFrame;
use clearcam_core::shapes::{Shape, ShapeKind};
use kurbo::{Point, Rect, Size};
use rayon::prelude::*;

/// Default supersampling grid per pixel axis.
pub const DEFAULT_SAMPLES: u32 = 4;

/// Composites shapes onto frames in software, rows in parallel.
#[derive(Debug, Clone, Copy)]
pub struct RasterCompositor {
    samples: u32,
}

impl Default for RasterCompositor {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl RasterCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an `n`x`n` sample grid per pixel for edge coverage.
    pub fn with_samples(samples: u32) -> Self {
        Self {
            samples: samples.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Geometry {
    Circle { center: Point, radius: f64 },
    Square { rect: Rect },
}

impl Geometry {
    fn contains(&self, p: Point) -> bool {
        match self {
            Geometry::Circle { center, radius } => p.distance(*center) <= *radius,
            Geometry::Square { rect } => {
                p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
            }
        }
    }

    fn bounds(&self) -> Rect {
        match self {
            Geometry::Circle { center, radius } => {
                Rect::from_center_size(*center, Size::new(radius * 2.0, radius * 2.0))
            }
            Geometry::Square { rect } => *rect,
        }
    }
}

/// A shape mapped to output pixels, ready to paint.
#[derive(Debug, Clone, Copy)]
struct Stamp {
    geometry: Geometry,
    bounds: Rect,
    rgb: [f32; 3],
    alpha: f32,
}

impl Stamp {
    fn new(shape: &Shape, scale: &CompositeScale) -> Option<Self> {
        let alpha = shape.alpha() as f32;
        let extent = scale.length(shape.extent());
        if alpha <= 0.0 || extent <= 0.0 || !extent.is_finite() {
            return None;
        }
        let center = scale.point(shape.center());
        let geometry = match shape.kind() {
            ShapeKind::Circle => Geometry::Circle {
                center,
                radius: extent,
            },
            ShapeKind::Square => Geometry::Square {
                rect: Rect::from_center_size(center, Size::new(extent, extent)),
            },
        };
        let rgba = fill_color(shape.color(), 100).to_rgba8();
        Some(Self {
            geometry,
            bounds: geometry.bounds(),
            rgb: [
                f32::from(rgba.r) / 255.0,
                f32::from(rgba.g) / 255.0,
                f32::from(rgba.b) / 255.0,
            ],
            alpha,
        })
    }

    /// Fraction of pixel (x, y) covered, from an `n`x`n` sample grid.
    fn coverage(&self, x: f64, y: f64, n: u32) -> f32 {
        let step = 1.0 / f64::from(n);
        let mut hits = 0u32;
        for j in 0..n {
            let sy = y + (f64::from(j) + 0.5) * step;
            for i in 0..n {
                let sx = x + (f64::from(i) + 0.5) * step;
                if self.geometry.contains(Point::new(sx, sy)) {
                    hits += 1;
                }
            }
        }
        hits as f32 / (n * n) as f32
    }

    fn paint_row(&self, y: usize, row: &mut [u8], samples: u32) {
        let y0 = y as f64;
        if y0 + 1.0 <= self.bounds.y0 || y0 >= self.bounds.y1 {
            return;
        }
        let width = row.len() / 4;
        let x_start = self.bounds.x0.floor().max(0.0) as usize;
        let x_end = (self.bounds.x1.ceil().max(0.0) as usize).min(width);
        for x in x_start..x_end {
            let coverage = self.coverage(x as f64, y0, samples);
            if coverage > 0.0 {
                blend_over(&mut row[x * 4..x * 4 + 4], self.rgb, self.alpha * coverage);
            }
        }
    }
}

/// Source-over blend of a straight-alpha color onto an RGBA8 pixel.
fn blend_over(pixel: &mut [u8], rgb: [f32; 3], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let base_a = f32::from(pixel[3]) / 255.0;
    let out_a = alpha + base_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return;
    }
    for (channel, top) in pixel.iter_mut().take(3).zip(rgb) {
        let base = f32::from(*channel) / 255.0;
        let value = (top * alpha + base * base_a * (1.0 - alpha)) / out_a;
        *channel = (value * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

impl FrameCompositor for RasterCompositor {
    fn compose(
        &self,
        frame: &DecodedFrame,
        shapes: &[Shape],
        display_size: Size,
        native_size: (u32, u32),
    ) -> RenderResult<DecodedFrame> {
        let (width, height) = native_size;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        if frame.pixels.len() != frame.width as usize * frame.height as usize * 4 {
            return Err(RenderError::FrameMismatch {
                width: frame.width,
                height: frame.height,
            });
        }

        let row_len = width as usize * 4;
        let mut canvas = vec![0u8; row_len * height as usize];

        // Frame at the origin, clipped to the canvas.
        let copy_len = frame.width.min(width) as usize * 4;
        let frame_row_len = frame.width as usize * 4;
        for y in 0..frame.height.min(height) as usize {
            let src = &frame.pixels[y * frame_row_len..y * frame_row_len + copy_len];
            canvas[y * row_len..y * row_len + copy_len].copy_from_slice(src);
        }

        let scale = CompositeScale::new(display_size, native_size);
        let stamps: Vec<Stamp> = shapes.iter().filter_map(|s| Stamp::new(s, &scale)).collect();
        log::debug!(
            "Compositing {} shapes onto {}x{} (scale {:.3}x{:.3}, radius x{:.3})",
            stamps.len(),
            width,
            height,
            scale.x,
            scale.y,
            scale.average
        );

        if !stamps.is_empty() {
            let samples = self.samples;
            canvas
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| {
                    for stamp in &stamps {
                        stamp.paint_row(y, row, samples);
                    }
                });
        }

        Ok(DecodedFrame {
            width,
            height,
            pixels: canvas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearcam_core::shapes::ShapeColor;

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const RED: [u8; 4] = [0xef, 0x44, 0x44, 255];

    fn circle(x: f64, y: f64, r: f64, opacity: u8) -> Shape {
        Shape::new(ShapeKind::Circle, Point::new(x, y), r, opacity, ShapeColor::CONTAMINATION)
    }

    fn compose(frame: &DecodedFrame, shapes: &[Shape], display: (f64, f64)) -> DecodedFrame {
        RasterCompositor::new()
            .compose(
                frame,
                shapes,
                Size::new(display.0, display.1),
                (frame.width, frame.height),
            )
            .unwrap()
    }

    #[test]
    fn test_circle_scaled_to_native() {
        let frame = DecodedFrame::solid(1920, 1080, BLACK);
        let out = compose(&frame, &[circle(100.0, 100.0, 20.0, 100)], (800.0, 450.0));

        // Center (240, 240), radius 48.
        assert_eq!(out.pixel(240, 240), Some(RED));
        assert_eq!(out.pixel(287, 240), Some(RED));
        assert_eq!(out.pixel(288, 240), Some(BLACK));
        assert_eq!(out.pixel(240, 192), Some(RED));
        assert_eq!(out.pixel(240, 191), Some(BLACK));
        assert_eq!(out.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_edge_pixels_partially_covered() {
        let frame = DecodedFrame::solid(64, 64, BLACK);
        let out = compose(&frame, &[circle(32.0, 32.0, 20.0, 100)], (64.0, 64.0));
        // A pixel on the diagonal edge is neither untouched nor fully red.
        let edge = out.pixel(46, 46).unwrap();
        assert!(edge[0] > 0 && edge[0] < 0xef, "edge pixel {edge:?}");
    }

    #[test]
    fn test_shape_opacity_is_independent() {
        let frame = DecodedFrame::solid(40, 40, BLACK);
        let out = compose(
            &frame,
            &[circle(10.0, 10.0, 6.0, 50), circle(30.0, 30.0, 6.0, 100)],
            (40.0, 40.0),
        );
        let half = out.pixel(10, 10).unwrap();
        assert!((i32::from(half[0]) - 120).abs() <= 1, "got {half:?}");
        assert_eq!(half[3], 255);
        assert_eq!(out.pixel(30, 30), Some(RED));
    }

    #[test]
    fn test_later_shapes_paint_over() {
        let blue = ShapeColor::new(0, 0, 255);
        let a = Shape::new(ShapeKind::Square, Point::new(10.0, 10.0), 10.0, 100, ShapeColor::CONTAMINATION);
        let b = Shape::new(ShapeKind::Square, Point::new(14.0, 14.0), 10.0, 100, blue);
        let frame = DecodedFrame::solid(30, 30, BLACK);
        let out = compose(&frame, &[a, b], (30.0, 30.0));
        assert_eq!(out.pixel(12, 12), Some([0, 0, 255, 255]));
        assert_eq!(out.pixel(6, 6), Some(RED));
    }

    #[test]
    fn test_transparent_frame_takes_shape_alpha() {
        let frame = DecodedFrame::solid(10, 10, [0, 0, 0, 0]);
        let out = compose(&frame, &[circle(5.0, 5.0, 4.0, 60)], (10.0, 10.0));
        let px = out.pixel(5, 5).unwrap();
        assert_eq!(&px[..3], &RED[..3]);
        assert_eq!(px[3], 153);
    }

    #[test]
    fn test_small_frame_is_placed_at_origin() {
        let frame = DecodedFrame::solid(2, 2, [1, 2, 3, 255]);
        let out = RasterCompositor::new()
            .compose(&frame, &[], Size::new(4.0, 4.0), (4, 3))
            .unwrap();
        assert_eq!((out.width, out.height), (4, 3));
        assert_eq!(out.pixel(1, 1), Some([1, 2, 3, 255]));
        assert_eq!(out.pixel(3, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_invalid_inputs() {
        let frame = DecodedFrame::solid(2, 2, BLACK);
        let compositor = RasterCompositor::with_samples(0);
        assert!(matches!(
            compositor.compose(&frame, &[], Size::new(2.0, 2.0), (0, 2)),
            Err(RenderError::InvalidSize { .. })
        ));
        let broken = DecodedFrame {
            width: 3,
            height: 3,
            pixels: vec![0; 4],
        };
        assert!(matches!(
            compositor.compose(&broken, &[], Size::new(2.0, 2.0), (2, 2)),
            Err(RenderError::FrameMismatch { .. })
        ));
    }
}

//! Annotation shape definitions.

mod circle;
mod square;

pub use circle::Circle;
pub use square::Square;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Highest per-shape opacity value.
pub const MAX_OPACITY: u8 = 100;

/// Opacity given to shapes that do not specify one.
pub const DEFAULT_OPACITY: u8 = 60;

pub(crate) fn default_opacity() -> u8 {
    DEFAULT_OPACITY
}

/// Fixed-palette color, serialized as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ShapeColor {
    /// Red fill used for contamination regions.
    pub const CONTAMINATION: Self = Self::new(0xef, 0x44, 0x44);
    /// Blue outline drawn around the selected shape on screen.
    pub const SELECTION: Self = Self::new(0x3b, 0x82, 0xf6);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self::CONTAMINATION
    }
}

impl fmt::Display for ShapeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for ShapeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("Invalid color: {s}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("Invalid color: {s}"))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for ShapeColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShapeColor> for String {
    fn from(color: ShapeColor) -> Self {
        color.to_string()
    }
}

/// The geometric kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
}

/// Partial update applied by `AnnotationStore::update_shape`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapePatch {
    pub center: Option<Point>,
    /// New radius (circle) or edge length (square).
    pub extent: Option<f64>,
    pub opacity: Option<u8>,
    pub color: Option<ShapeColor>,
}

impl ShapePatch {
    /// Patch that only changes opacity.
    pub fn opacity(opacity: u8) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Center point in content coordinates.
    fn center(&self) -> Point;

    /// Radius for circles, edge length for squares.
    fn extent(&self) -> f64;

    /// Get the bounding box in content coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in content coordinates) lies on this shape.
    fn hit_test(&self, point: Point) -> bool;
}

/// Enum wrapper for all shape types (for serialization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Circle(Circle),
    Square(Square),
}

impl Shape {
    /// Create a shape of the given kind with a fresh id.
    pub fn new(kind: ShapeKind, center: Point, extent: f64, opacity: u8, color: ShapeColor) -> Self {
        match kind {
            ShapeKind::Circle => {
                let mut circle = Circle::new(center, extent);
                circle.opacity = opacity.min(MAX_OPACITY);
                circle.color = color;
                Shape::Circle(circle)
            }
            ShapeKind::Square => {
                let mut square = Square::new(center, extent);
                square.opacity = opacity.min(MAX_OPACITY);
                square.color = color;
                Shape::Square(square)
            }
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Square(_) => ShapeKind::Square,
        }
    }

    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Circle(s) => s.id(),
            Shape::Square(s) => s.id(),
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Shape::Circle(s) => s.center(),
            Shape::Square(s) => s.center(),
        }
    }

    pub fn extent(&self) -> f64 {
        match self {
            Shape::Circle(s) => s.extent(),
            Shape::Square(s) => s.extent(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Circle(s) => s.bounds(),
            Shape::Square(s) => s.bounds(),
        }
    }

    pub fn hit_test(&self, point: Point) -> bool {
        match self {
            Shape::Circle(s) => s.hit_test(point),
            Shape::Square(s) => s.hit_test(point),
        }
    }

    /// Opacity in percent (0-100).
    pub fn opacity(&self) -> u8 {
        match self {
            Shape::Circle(s) => s.opacity,
            Shape::Square(s) => s.opacity,
        }
    }

    /// Opacity as an alpha factor in `0.0..=1.0`.
    pub fn alpha(&self) -> f64 {
        f64::from(self.opacity().min(MAX_OPACITY)) / 100.0
    }

    pub fn color(&self) -> ShapeColor {
        match self {
            Shape::Circle(s) => s.color,
            Shape::Square(s) => s.color,
        }
    }

    /// Set the radius/size. Negative values are stored as zero.
    pub fn set_extent(&mut self, extent: f64) {
        let extent = extent.max(0.0);
        match self {
            Shape::Circle(s) => s.radius = extent,
            Shape::Square(s) => s.size = extent,
        }
    }

    /// Return a copy with the patch applied.
    pub fn patched(&self, patch: &ShapePatch) -> Shape {
        let mut shape = self.clone();
        match &mut shape {
            Shape::Circle(s) => {
                if let Some(center) = patch.center {
                    s.x = center.x;
                    s.y = center.y;
                }
                if let Some(opacity) = patch.opacity {
                    s.opacity = opacity.min(MAX_OPACITY);
                }
                if let Some(color) = patch.color {
                    s.color = color;
                }
            }
            Shape::Square(s) => {
                if let Some(center) = patch.center {
                    s.x = center.x;
                    s.y = center.y;
                }
                if let Some(opacity) = patch.opacity {
                    s.opacity = opacity.min(MAX_OPACITY);
                }
                if let Some(color) = patch.color {
                    s.color = color;
                }
            }
        }
        if let Some(extent) = patch.extent {
            shape.set_extent(extent);
        }
        shape
    }

    /// A shape is committable when its extent is a positive finite number.
    pub fn has_positive_extent(&self) -> bool {
        let extent = self.extent();
        extent.is_finite() && extent > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        assert_eq!(ShapeColor::CONTAMINATION.to_string(), "#ef4444");
        assert_eq!("#3B82F6".parse::<ShapeColor>().unwrap(), ShapeColor::SELECTION);
        assert!("#12345".parse::<ShapeColor>().is_err());
        assert!("zzzzzz".parse::<ShapeColor>().is_err());
    }

    #[test]
    fn test_shape_json_shape() {
        let shape = Shape::new(
            ShapeKind::Circle,
            Point::new(100.0, 100.0),
            20.0,
            60,
            ShapeColor::CONTAMINATION,
        );
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "circle");
        assert_eq!(value["x"], 100.0);
        assert_eq!(value["radius"], 20.0);
        assert_eq!(value["opacity"], 60);
        assert_eq!(value["color"], "#ef4444");

        let back: Shape = serde_json::from_value(value).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    fn test_minimal_json_gets_defaults() {
        let a: Shape = serde_json::from_str(r#"{"type":"circle","x":5,"y":6,"radius":7}"#).unwrap();
        let b: Shape = serde_json::from_str(r#"{"type":"circle","x":5,"y":6,"radius":7}"#).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.opacity(), DEFAULT_OPACITY);
        assert_eq!(a.color(), ShapeColor::CONTAMINATION);
    }

    #[test]
    fn test_square_json_uses_size() {
        let shape = Shape::new(ShapeKind::Square, Point::ZERO, 8.0, 40, ShapeColor::default());
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "square");
        assert_eq!(value["size"], 8.0);
        assert!(value.get("radius").is_none());
    }

    #[test]
    fn test_opacity_clamped() {
        let shape = Shape::new(ShapeKind::Circle, Point::ZERO, 1.0, 250, ShapeColor::default());
        assert_eq!(shape.opacity(), MAX_OPACITY);
        assert!((shape.alpha() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_patch_keeps_id() {
        let shape = Shape::new(ShapeKind::Square, Point::ZERO, 10.0, 60, ShapeColor::default());
        let patched = shape.patched(&ShapePatch {
            center: Some(Point::new(3.0, 4.0)),
            extent: Some(-2.0),
            opacity: Some(30),
            color: None,
        });
        assert_eq!(patched.id(), shape.id());
        assert_eq!(patched.center(), Point::new(3.0, 4.0));
        assert_eq!(patched.extent(), 0.0);
        assert_eq!(patched.opacity(), 30);
        assert!(!patched.has_positive_extent());
    }
}

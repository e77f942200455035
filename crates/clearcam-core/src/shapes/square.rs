//! Square shape.

use super::{ShapeColor, ShapeId, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An axis-aligned filled square, positioned by its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Square {
    #[serde(default = "Uuid::new_v4")]
    pub(crate) id: ShapeId,
    /// Center x in content coordinates.
    pub x: f64,
    /// Center y in content coordinates.
    pub y: f64,
    /// Edge length.
    pub size: f64,
    /// Opacity in percent (0-100).
    #[serde(default = "super::default_opacity")]
    pub opacity: u8,
    #[serde(default)]
    pub color: ShapeColor,
}

impl Square {
    /// Create a new square.
    pub fn new(center: Point, size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: center.x,
            y: center.y,
            size: size.max(0.0),
            opacity: super::DEFAULT_OPACITY,
            color: ShapeColor::default(),
        }
    }
}

impl ShapeTrait for Square {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn extent(&self) -> f64 {
        self.size
    }

    fn bounds(&self) -> Rect {
        let half = self.size / 2.0;
        Rect::new(self.x - half, self.y - half, self.x + half, self.y + half)
    }

    fn hit_test(&self, point: Point) -> bool {
        // Inclusive on all four edges.
        let b = self.bounds();
        point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_inside_and_edges() {
        let square = Square::new(Point::new(10.0, 10.0), 10.0);
        assert!(square.hit_test(Point::new(10.0, 10.0)));
        assert!(square.hit_test(Point::new(5.0, 15.0)));
        assert!(!square.hit_test(Point::new(4.9, 10.0)));
        assert!(!square.hit_test(Point::new(10.0, 15.1)));
    }

    #[test]
    fn test_corner_is_inside() {
        // Corners are outside the inscribed circle but inside the square.
        let square = Square::new(Point::ZERO, 20.0);
        assert!(square.hit_test(Point::new(9.9, -9.9)));
    }
}

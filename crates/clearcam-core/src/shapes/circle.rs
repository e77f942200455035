//! Circle shape.

use super::{ShapeColor, ShapeId, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A filled circle marking a contamination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    #[serde(default = "Uuid::new_v4")]
    pub(crate) id: ShapeId,
    /// Center x in content coordinates.
    pub x: f64,
    /// Center y in content coordinates.
    pub y: f64,
    pub radius: f64,
    /// Opacity in percent (0-100).
    #[serde(default = "super::default_opacity")]
    pub opacity: u8,
    #[serde(default)]
    pub color: ShapeColor,
}

impl Circle {
    /// Create a new circle.
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: center.x,
            y: center.y,
            radius: radius.max(0.0),
            opacity: super::DEFAULT_OPACITY,
            color: ShapeColor::default(),
        }
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn extent(&self) -> f64 {
        self.radius
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.radius,
            self.y - self.radius,
            self.x + self.radius,
            self.y + self.radius,
        )
    }

    fn hit_test(&self, point: Point) -> bool {
        point.distance(self.center()) <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_center() {
        let circle = Circle::new(Point::new(50.0, 50.0), 30.0);
        assert!(circle.hit_test(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_hit_test_edge() {
        let circle = Circle::new(Point::new(0.0, 0.0), 10.0);
        assert!(circle.hit_test(Point::new(10.0, 0.0)));
        assert!(circle.hit_test(Point::new(6.0, 8.0)));
        assert!(!circle.hit_test(Point::new(7.5, 7.5)));
    }

    #[test]
    fn test_bounds() {
        let circle = Circle::new(Point::new(50.0, 50.0), 20.0);
        let bounds = circle.bounds();
        assert!((bounds.x0 - 30.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }
}

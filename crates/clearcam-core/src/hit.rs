//! Picking the shape under a content-space point.
//!
//! Shapes are stored in insertion order, which is also paint order, so the
//! topmost shape is the last one. Lookups walk the list back to front.

use crate::shapes::{Shape, ShapeId};
use kurbo::Point;

/// Return the topmost shape containing `point`, if any.
pub fn hit_test(point: Point, shapes: &[Shape]) -> Option<&Shape> {
    shapes.iter().rev().find(|shape| shape.hit_test(point))
}

/// All shapes containing `point`, topmost first.
pub fn shapes_at_point(point: Point, shapes: &[Shape]) -> Vec<ShapeId> {
    shapes
        .iter()
        .rev()
        .filter(|shape| shape.hit_test(point))
        .map(Shape::id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ShapeColor, ShapeKind};

    fn circle(x: f64, y: f64, r: f64) -> Shape {
        Shape::new(ShapeKind::Circle, Point::new(x, y), r, 60, ShapeColor::default())
    }

    fn square(x: f64, y: f64, size: f64) -> Shape {
        Shape::new(ShapeKind::Square, Point::new(x, y), size, 60, ShapeColor::default())
    }

    #[test]
    fn test_topmost_wins_for_concentric_circles() {
        let a = circle(50.0, 50.0, 30.0);
        let b = circle(50.0, 50.0, 10.0);
        let shapes = vec![a.clone(), b.clone()];
        assert_eq!(hit_test(Point::new(50.0, 50.0), &shapes).map(Shape::id), Some(b.id()));
        // Outside B but inside A.
        assert_eq!(hit_test(Point::new(50.0, 75.0), &shapes).map(Shape::id), Some(a.id()));
    }

    #[test]
    fn test_mixed_kinds() {
        let sq = square(0.0, 0.0, 20.0);
        let c = circle(100.0, 0.0, 5.0);
        let shapes = vec![sq.clone(), c.clone()];
        assert_eq!(hit_test(Point::new(9.0, 9.0), &shapes).map(Shape::id), Some(sq.id()));
        assert_eq!(hit_test(Point::new(103.0, 4.0), &shapes).map(Shape::id), Some(c.id()));
        assert!(hit_test(Point::new(50.0, 50.0), &shapes).is_none());
    }

    #[test]
    fn test_empty_list() {
        assert!(hit_test(Point::ZERO, &[]).is_none());
    }

    #[test]
    fn test_shapes_at_point_order() {
        let a = square(0.0, 0.0, 40.0);
        let b = circle(0.0, 0.0, 10.0);
        let c = circle(500.0, 0.0, 10.0);
        let shapes = vec![a.clone(), b.clone(), c];
        assert_eq!(shapes_at_point(Point::ZERO, &shapes), vec![b.id(), a.id()]);
    }
}

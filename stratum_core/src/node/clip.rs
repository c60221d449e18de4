// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip paths for children clipping and hit testing.

use kurbo::{BezPath, Point, Rect, Shape};

/// A closed path that clips a node's children.
///
/// Expressed in the node's local coordinates. Containment uses the non-zero
/// winding rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPath {
    path: BezPath,
}

impl ClipPath {
    /// Wraps an arbitrary path.
    #[must_use]
    pub fn new(path: BezPath) -> Self {
        Self { path }
    }

    /// A clip path covering `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            path: rect.to_path(0.1),
        }
    }

    /// A polygon through `points`, closed back to the first.
    #[must_use]
    pub fn polygon(points: &[Point]) -> Self {
        let mut path = BezPath::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            path.move_to(*first);
            for p in iter {
                path.line_to(*p);
            }
            path.close_path();
        }
        Self { path }
    }

    /// Returns the underlying path.
    #[must_use]
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Whether `point` is inside the path.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.path.contains(point)
    }

    /// Bounding box of the path.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        self.path.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_clip_contains_interior_only() {
        let clip = ClipPath::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(clip.contains(Point::new(5.0, 5.0)));
        assert!(!clip.contains(Point::new(15.0, 5.0)));
    }

    #[test]
    fn triangle_clip() {
        let clip = ClipPath::polygon(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(clip.contains(Point::new(2.0, 2.0)));
        assert!(!clip.contains(Point::new(8.0, 8.0)));
        assert_eq!(clip.bounding_box(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn empty_polygon_contains_nothing() {
        let clip = ClipPath::polygon(&[]);
        assert!(!clip.contains(Point::ZERO));
    }
}

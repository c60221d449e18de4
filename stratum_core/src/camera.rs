// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Perspective camera attached to a node.

use kurbo::Point;

use crate::transform::Transform3d;

/// A viewer positioned above the node's parent plane.
///
/// The camera only matters for nodes whose transform lifts them out of the
/// `z = 0` plane; planar content projects onto itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Vanishing point, in the parent's coordinate space.
    pub position: Point,
    /// Distance from the eye to the `z = 0` plane.
    pub distance: f64,
}

impl Camera {
    /// Creates a camera.
    #[inline]
    #[must_use]
    pub const fn new(position: Point, distance: f64) -> Self {
        Self { position, distance }
    }

    /// Returns the projection `P(distance, position)`.
    ///
    /// A distance of `0` or a non-finite distance yields the identity.
    #[must_use]
    pub fn projection(&self) -> Transform3d {
        if self.distance == 0.0 || !self.distance.is_finite() {
            return Transform3d::IDENTITY;
        }
        Transform3d::about(self.position, Transform3d::from_perspective(self.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_distances_are_identity() {
        for d in [0.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let camera = Camera::new(Point::new(10.0, 20.0), d);
            assert!(camera.projection().is_identity(), "distance {d}");
        }
    }

    #[test]
    fn vanishing_point_is_fixed() {
        let camera = Camera::new(Point::new(40.0, 30.0), 500.0);
        let p = camera.projection().transform_point(camera.position);
        assert!((p.x - 40.0).abs() < 1e-9);
        assert!((p.y - 30.0).abs() < 1e-9);
    }

    #[test]
    fn planar_points_are_unchanged() {
        let camera = Camera::new(Point::new(0.0, 0.0), 300.0);
        let p = camera.projection().transform_point(Point::new(12.0, -8.0));
        assert!((p.x - 12.0).abs() < 1e-9);
        assert!((p.y + 8.0).abs() < 1e-9);
    }

    #[test]
    fn lifted_points_are_magnified() {
        let camera = Camera::new(Point::new(0.0, 0.0), 100.0);
        let lift = Transform3d::from_translation(0.0, 0.0, 50.0);
        let p = (camera.projection() * lift).transform_point(Point::new(10.0, 0.0));
        assert!((p.x - 20.0).abs() < 1e-9);
    }
}

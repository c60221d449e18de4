// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform used for node placement.
//!
//! A node's authored transform is expressed in its parent's coordinate space.
//! Purely planar transforms take the cheap affine path (see
//! [`Transform3d::is_2d`]); anything else is treated as a projective mapping
//! of the node's `z = 0` plane.

use core::ops::Mul;

use kurbo::{Affine, Point, Rect};

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the layout used by
/// CSS `matrix3d` and Core Animation's `CATransform3D`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Returns the element at `row`, `col`.
    #[inline]
    #[must_use]
    pub const fn get(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the X axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_x(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a perspective projection looking down `-z` with the eye at
    /// `distance` from the `z = 0` plane.
    ///
    /// Points on the plane are unaffected; points in front of it are
    /// magnified.
    #[inline]
    #[must_use]
    pub fn from_perspective(distance: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.cols[2][3] = -1.0 / distance;
        t
    }

    /// Lifts a planar affine transform into 4×4 form.
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            cols: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
        }
    }

    /// Returns the planar affine part if this transform [is 2-D](Self::is_2d).
    #[must_use]
    pub fn to_affine(&self) -> Option<Affine> {
        self.is_2d().then(|| {
            let c = &self.cols;
            Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]])
        })
    }

    /// Returns `t` applied about `origin` instead of about `(0, 0)`.
    #[must_use]
    pub fn about(origin: Point, t: Self) -> Self {
        Self::from_translation(origin.x, origin.y, 0.0)
            * t
            * Self::from_translation(-origin.x, -origin.y, 0.0)
    }

    /// Whether this is bit-for-bit the identity matrix.
    ///
    /// Used to skip redundant backend writes; nearly-identity matrices are
    /// not identity.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(Self::IDENTITY.cols.iter().flatten())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// Whether this transform keeps the `z = 0` plane flat and has no
    /// perspective component.
    ///
    /// Hit testing takes the direct inverse-affine path when this holds.
    #[must_use]
    pub fn is_2d(&self) -> bool {
        let c = &self.cols;
        c[0][2] == 0.0
            && c[0][3] == 0.0
            && c[1][2] == 0.0
            && c[1][3] == 0.0
            && c[2] == [0.0, 0.0, 1.0, 0.0]
            && c[3][2] == 0.0
            && c[3][3] == 1.0
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Is this transform [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[inline]
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.cols.iter().flatten().any(|v| v.is_nan())
    }

    /// Returns this transform with a horizontal flip about the vertical line
    /// `x = at` applied first.
    #[must_use]
    pub fn flip_horizontally(self, at: f64) -> Self {
        let flip = Self::from_cols(
            [-1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [2.0 * at, 0.0, 0.0, 1.0],
        );
        self * flip
    }

    /// Maps a point on the `z = 0` plane.
    ///
    /// The result is divided by the homogeneous `w` unless `w` is `0` or `1`.
    #[must_use]
    pub fn transform_point(&self, p: Point) -> Point {
        let x = self.get(0, 0) * p.x + self.get(0, 1) * p.y + self.get(0, 3);
        let y = self.get(1, 0) * p.x + self.get(1, 1) * p.y + self.get(1, 3);
        let w = self.get(3, 0) * p.x + self.get(3, 1) * p.y + self.get(3, 3);
        if w == 0.0 || w == 1.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Returns the axis-aligned bounding box of `rect` after mapping its
    /// corners.
    #[must_use]
    pub fn map_rect(&self, rect: Rect) -> Rect {
        if self.is_identity() {
            return rect;
        }
        let corners = [
            self.transform_point(Point::new(rect.x0, rect.y0)),
            self.transform_point(Point::new(rect.x1, rect.y0)),
            self.transform_point(Point::new(rect.x1, rect.y1)),
            self.transform_point(Point::new(rect.x0, rect.y1)),
        ];
        let mut out = Rect::from_points(corners[0], corners[1]);
        out = out.union_pt(corners[2]);
        out.union_pt(corners[3])
    }

    /// Finds the point on the local `z = 0` plane that this transform maps onto
    /// `p`.
    ///
    /// Equivalent to intersecting the ray through `p` perpendicular to the
    /// screen with the transformed plane and mapping the hit back. Returns
    /// `None` when the plane is seen edge-on or the matrix is degenerate.
    #[must_use]
    pub fn unproject(&self, p: Point) -> Option<Point> {
        if let Some(affine) = self.to_affine() {
            let det = affine.determinant();
            if det == 0.0 || !det.is_finite() {
                return None;
            }
            return Some(affine.inverse() * p);
        }
        let a11 = self.get(0, 0) - p.x * self.get(3, 0);
        let a12 = self.get(0, 1) - p.x * self.get(3, 1);
        let b1 = p.x * self.get(3, 3) - self.get(0, 3);
        let a21 = self.get(1, 0) - p.y * self.get(3, 0);
        let a22 = self.get(1, 1) - p.y * self.get(3, 1);
        let b2 = p.y * self.get(3, 3) - self.get(1, 3);
        let det = a11 * a22 - a12 * a21;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Point::new(
            (b1 * a22 - a12 * b2) / det,
            (a11 * b2 - b1 * a21) / det,
        ))
    }

    /// Returns the inverse matrix, or `None` if it is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let m = |r: usize, c: usize| self.get(r, c);

        let s0 = m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1);
        let s1 = m(0, 0) * m(1, 2) - m(1, 0) * m(0, 2);
        let s2 = m(0, 0) * m(1, 3) - m(1, 0) * m(0, 3);
        let s3 = m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2);
        let s4 = m(0, 1) * m(1, 3) - m(1, 1) * m(0, 3);
        let s5 = m(0, 2) * m(1, 3) - m(1, 2) * m(0, 3);

        let c5 = m(2, 2) * m(3, 3) - m(3, 2) * m(2, 3);
        let c4 = m(2, 1) * m(3, 3) - m(3, 1) * m(2, 3);
        let c3 = m(2, 1) * m(3, 2) - m(3, 1) * m(2, 2);
        let c2 = m(2, 0) * m(3, 3) - m(3, 0) * m(2, 3);
        let c1 = m(2, 0) * m(3, 2) - m(3, 0) * m(2, 2);
        let c0 = m(2, 0) * m(3, 1) - m(3, 0) * m(2, 1);

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;

        let mut out = [[0.0_f64; 4]; 4];
        // out[col][row]
        out[0][0] = (m(1, 1) * c5 - m(1, 2) * c4 + m(1, 3) * c3) * inv;
        out[1][0] = (-m(0, 1) * c5 + m(0, 2) * c4 - m(0, 3) * c3) * inv;
        out[2][0] = (m(3, 1) * s5 - m(3, 2) * s4 + m(3, 3) * s3) * inv;
        out[3][0] = (-m(2, 1) * s5 + m(2, 2) * s4 - m(2, 3) * s3) * inv;

        out[0][1] = (-m(1, 0) * c5 + m(1, 2) * c2 - m(1, 3) * c1) * inv;
        out[1][1] = (m(0, 0) * c5 - m(0, 2) * c2 + m(0, 3) * c1) * inv;
        out[2][1] = (-m(3, 0) * s5 + m(3, 2) * s2 - m(3, 3) * s1) * inv;
        out[3][1] = (m(2, 0) * s5 - m(2, 2) * s2 + m(2, 3) * s1) * inv;

        out[0][2] = (m(1, 0) * c4 - m(1, 1) * c2 + m(1, 3) * c0) * inv;
        out[1][2] = (-m(0, 0) * c4 + m(0, 1) * c2 - m(0, 3) * c0) * inv;
        out[2][2] = (m(3, 0) * s4 - m(3, 1) * s2 + m(3, 3) * s0) * inv;
        out[3][2] = (-m(2, 0) * s4 + m(2, 1) * s2 - m(2, 3) * s0) * inv;

        out[0][3] = (-m(1, 0) * c3 + m(1, 1) * c1 - m(1, 2) * c0) * inv;
        out[1][3] = (m(0, 0) * c3 - m(0, 1) * c1 + m(0, 2) * c0) * inv;
        out[2][3] = (-m(3, 0) * s3 + m(3, 1) * s1 - m(3, 2) * s0) * inv;
        out[3][3] = (m(2, 0) * s3 - m(2, 1) * s1 + m(2, 2) * s0) * inv;

        Some(Self { cols: out })
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Transform3d {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

impl Mul for Transform3d {
    type Output = Self;

    /// `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    fn mat_close(a: &Transform3d, b: &Transform3d) -> bool {
        a.cols
            .iter()
            .flatten()
            .zip(b.cols.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert!(Transform3d::default().is_identity());
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn translation_composition() {
        let a = Transform3d::from_translation(1.0, 0.0, 0.0);
        let b = Transform3d::from_translation(0.0, 2.0, 0.0);
        assert_eq!((a * b).col(3), [1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn scale_then_translate_applies_right_operand_first() {
        let s = Transform3d::from_scale(2.0, 2.0, 2.0);
        let t = Transform3d::from_translation(3.0, 4.0, 0.0);
        let p = (t * s).transform_point(Point::new(1.0, 1.0));
        assert!(close(p, Point::new(5.0, 6.0)));
    }

    #[test]
    fn nearly_identity_is_not_identity() {
        let mut t = Transform3d::IDENTITY;
        t.cols[3][0] = 1e-300;
        assert!(!t.is_identity());
        // Negative zero differs in bits.
        let mut z = Transform3d::IDENTITY;
        z.cols[3][0] = -0.0;
        assert!(!z.is_identity());
    }

    #[test]
    fn affine_round_trip() {
        let affine = Affine::rotate(0.3).then_translate((4.0, -2.0).into());
        let t = Transform3d::from_affine(affine);
        assert!(t.is_2d());
        let back = t.to_affine().unwrap();
        for (a, b) in back.as_coeffs().iter().zip(affine.as_coeffs()) {
            assert!((a - b).abs() < 1e-12);
        }
        let p = Point::new(3.0, 7.0);
        assert!(close(t.transform_point(p), affine * p));
    }

    #[test]
    fn rotation_y_is_not_2d() {
        assert!(!Transform3d::from_rotation_y(FRAC_PI_4).is_2d());
        assert!(Transform3d::from_rotation_z(FRAC_PI_4).is_2d());
        assert!(Transform3d::from_rotation_y(FRAC_PI_4).to_affine().is_none());
    }

    #[test]
    fn inverse_of_composite() {
        let t = Transform3d::from_translation(5.0, -3.0, 2.0)
            * Transform3d::from_rotation_x(0.4)
            * Transform3d::from_scale(2.0, 0.5, 1.5);
        let inv = t.inverse().unwrap();
        assert!(mat_close(&(t * inv), &Transform3d::IDENTITY));
        assert!(mat_close(&(inv * t), &Transform3d::IDENTITY));
    }

    #[test]
    fn singular_has_no_inverse() {
        let t = Transform3d::from_scale(0.0, 1.0, 1.0);
        assert!(t.inverse().is_none());
        assert!(t.unproject(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn flip_mirrors_about_line() {
        let t = Transform3d::IDENTITY.flip_horizontally(50.0);
        assert!(close(t.transform_point(Point::new(10.0, 3.0)), Point::new(90.0, 3.0)));
        // Flipping twice is the identity.
        let twice = t.flip_horizontally(50.0);
        assert!(mat_close(&twice, &Transform3d::IDENTITY));
    }

    #[test]
    fn about_rotates_around_origin_point() {
        let t = Transform3d::about(
            Point::new(10.0, 10.0),
            Transform3d::from_rotation_z(FRAC_PI_2),
        );
        assert!(close(t.transform_point(Point::new(10.0, 10.0)), Point::new(10.0, 10.0)));
        assert!(close(t.transform_point(Point::new(20.0, 10.0)), Point::new(10.0, 20.0)));
    }

    #[test]
    fn map_rect_of_rotation_is_bounding_box() {
        let r = Rect::new(0.0, 0.0, 10.0, 20.0);
        let t = Transform3d::from_rotation_z(FRAC_PI_2);
        let b = t.map_rect(r);
        assert!((b.x0 + 20.0).abs() < 1e-9);
        assert!((b.x1 - 0.0).abs() < 1e-9);
        assert!((b.y0 - 0.0).abs() < 1e-9);
        assert!((b.y1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unproject_inverts_perspective_mapping() {
        let t = Transform3d::about(
            Point::new(50.0, 50.0),
            Transform3d::from_perspective(400.0) * Transform3d::from_rotation_y(0.6),
        );
        assert!(!t.is_2d());
        for p in [
            Point::new(0.0, 0.0),
            Point::new(25.0, 80.0),
            Point::new(100.0, 100.0),
        ] {
            let screen = t.transform_point(p);
            let back = t.unproject(screen).unwrap();
            assert!(close(back, p), "{p:?} -> {screen:?} -> {back:?}");
        }
    }

    #[test]
    fn unproject_edge_on_plane_fails() {
        // Rotation about y by a right angle, with exact zeros.
        let t = Transform3d::from_cols(
            [0.0, 0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        );
        assert!(t.unproject(Point::new(0.0, 5.0)).is_none());
    }

    #[test]
    fn nan_and_infinity_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
        let mut u = Transform3d::IDENTITY;
        u.cols[0][3] = f64::INFINITY;
        assert!(!u.is_finite());
        assert!(!u.is_nan());
    }
}

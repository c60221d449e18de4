// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate mapping, hit testing, and size queries.
//!
//! A node's local space has its origin at the top-left of its bounds. The
//! *resolved* transform is the authored transform with the mirror flip
//! applied when needed; the *projected* transform adds the camera. Mapping a
//! local point into the parent offsets it by the bounds origin and then
//! applies the projected transform.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};

use crate::layout::{LayoutChild, LookupResult, SizePreferences};
use crate::transform::Transform3d;

use super::id::{Container, NodeId};
use super::store::NodeStore;

impl NodeStore {
    // -- Transforms --

    /// The authored transform with the mirror flip applied when needed.
    #[must_use]
    pub fn resolved_transform(&self, id: NodeId) -> Transform3d {
        self.validate(id);
        self.resolved_transform_idx(id.idx)
    }

    pub(crate) fn resolved_transform_idx(&self, idx: u32) -> Transform3d {
        let i = idx as usize;
        let t = self.transform[i];
        if self.needs_mirror[i] {
            t.flip_horizontally(self.bounds[i].center().x)
        } else {
            t
        }
    }

    /// The resolved transform composed with the camera projection.
    ///
    /// This is what the node's surface receives.
    #[must_use]
    pub fn projected_transform(&self, id: NodeId) -> Transform3d {
        self.validate(id);
        self.projected_transform_idx(id.idx)
    }

    pub(crate) fn projected_transform_idx(&self, idx: u32) -> Transform3d {
        let resolved = self.resolved_transform_idx(idx);
        match self.camera[idx as usize] {
            Some(camera) => camera.projection() * resolved,
            None => resolved,
        }
    }

    // -- Coordinate mapping --

    /// Maps a point from `id`'s local space into its parent's space.
    #[must_use]
    pub fn local_to_parent(&self, id: NodeId, point: Point) -> Point {
        self.validate(id);
        let origin = self.bounds[id.idx as usize].origin().to_vec2();
        self.projected_transform_idx(id.idx)
            .transform_point(point + origin)
    }

    /// Maps a point from the parent's space into `id`'s local space.
    ///
    /// Returns `None` when the transform is degenerate (for example a plane
    /// seen edge-on).
    #[must_use]
    pub fn parent_to_local(&self, id: NodeId, point: Point) -> Option<Point> {
        self.validate(id);
        let origin = self.bounds[id.idx as usize].origin().to_vec2();
        self.projected_transform_idx(id.idx)
            .unproject(point)
            .map(|p| p - origin)
    }

    /// Maps a local point into display coordinates.
    #[must_use]
    pub fn to_absolute(&self, id: NodeId, point: Point) -> Point {
        let mut p = self.local_to_parent(id, point);
        for ancestor in self.ancestors(id) {
            p = self.local_to_parent(ancestor, p);
        }
        p
    }

    /// Maps a display point into `id`'s local coordinates.
    #[must_use]
    pub fn from_absolute(&self, id: NodeId, point: Point) -> Option<Point> {
        let mut chain: Vec<NodeId> = self.ancestors(id).collect();
        chain.reverse();
        chain.push(id);
        chain
            .into_iter()
            .try_fold(point, |p, node| self.parent_to_local(node, p))
    }

    /// Maps `point` from `from`'s local space (or the display when `None`)
    /// into `id`'s local space.
    #[must_use]
    pub fn to_local(&self, id: NodeId, point: Point, from: Option<NodeId>) -> Option<Point> {
        match from {
            None => self.from_absolute(id, point),
            Some(from) if from == id => {
                self.validate(id);
                Some(point)
            }
            Some(from) if self.parent(id) == Some(from) => self.parent_to_local(id, point),
            Some(from) => self.from_absolute(id, self.to_absolute(from, point)),
        }
    }

    // -- Hit testing --

    /// Whether `point`, in the parent's space, falls inside `id`'s bounds.
    #[must_use]
    pub fn contains(&self, id: NodeId, point: Point) -> bool {
        let size = self.size(id);
        self.parent_to_local(id, point)
            .is_some_and(|p| Rect::from_origin_size(Point::ZERO, size).contains(p))
    }

    /// The direct child of `id` at `point`, in `id`'s local space.
    #[must_use]
    pub fn child_at(&self, id: NodeId, point: Point) -> Option<NodeId> {
        if let Some(clip) = self.children_clip(id)
            && !clip.contains(point)
        {
            return None;
        }
        self.locate(Container::Node(id), point)
    }

    /// The deepest visible node under `point`, in the parent's space.
    ///
    /// Returns `id` itself when none of its children is hit, and `None` when
    /// `id` is invisible or `point` is outside it.
    #[must_use]
    pub fn hit_test(&self, id: NodeId, point: Point) -> Option<NodeId> {
        if !self.visible(id) || !self.contains(id, point) {
            return None;
        }
        let local = self.parent_to_local(id, point)?;
        match self.child_at(id, local) {
            Some(child) => self.hit_test(child, local).or(Some(id)),
            None => Some(id),
        }
    }

    /// The deepest visible node under a display point.
    ///
    /// Popups are tested first, newest on top.
    #[must_use]
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        for &popup in self.display.popups.iter().rev() {
            if let Some(hit) = self.hit_test(popup, point) {
                return Some(hit);
            }
        }
        let top = self.locate(Container::Display, point)?;
        self.hit_test(top, point)
    }

    /// Asks the container's layout, falling back to a z-ordered scan.
    fn locate(&self, container: Container, point: Point) -> Option<NodeId> {
        let layout = match container {
            Container::Display => self.display.layout.as_deref(),
            Container::Node(id) => self.layout[id.idx as usize].as_deref(),
        };
        if let Some(layout) = layout {
            match layout.locate_child(&self.layout_children(container), point) {
                LookupResult::Found(child) => return Some(child),
                LookupResult::Empty => return None,
                LookupResult::Ignored => {}
            }
        }
        let mut best: Option<(i32, NodeId)> = None;
        for &child in self.children_of(container).iter().rev() {
            if !self.visible[child.idx as usize] || !self.contains(child, point) {
                continue;
            }
            let z = self.z_order[child.idx as usize];
            if best.is_none_or(|(bz, _)| z > bz) {
                best = Some((z, child));
            }
        }
        best.map(|(_, child)| child)
    }

    // -- Display rect --

    /// The part of `id` visible on the display, in local coordinates.
    ///
    /// Empty when the node is detached, hidden, or clipped away by an
    /// ancestor's bounds.
    #[must_use]
    pub fn display_rect(&self, id: NodeId) -> Rect {
        if !self.is_attached(id) || !self.recursively_visible(id) {
            return Rect::ZERO;
        }
        self.display_rect_unchecked(id)
    }

    fn display_rect_unchecked(&self, id: NodeId) -> Rect {
        let parent_rect = match self.parent(id) {
            Some(p) => self.display_rect_unchecked(p),
            None => self.display.bounds(),
        };
        if is_empty(parent_rect) {
            return Rect::ZERO;
        }
        let corners = [
            Point::new(parent_rect.x0, parent_rect.y0),
            Point::new(parent_rect.x1, parent_rect.y0),
            Point::new(parent_rect.x1, parent_rect.y1),
            Point::new(parent_rect.x0, parent_rect.y1),
        ];
        let mut mapped: Option<Rect> = None;
        for c in corners {
            let Some(p) = self.parent_to_local(id, c) else {
                return Rect::ZERO;
            };
            mapped = Some(match mapped {
                Some(r) => r.union_pt(p),
                None => Rect::from_points(p, p),
            });
        }
        let local = Rect::from_origin_size(Point::ZERO, self.size(id));
        let rect = mapped.map_or(Rect::ZERO, |m| local.intersect(m));
        if is_empty(rect) { Rect::ZERO } else { rect }
    }

    // -- Size queries --

    /// Preferred size, consulting the node's layout when it has one.
    #[must_use]
    pub fn ideal_size(&self, id: NodeId) -> Option<Size> {
        let stored = self.size_preferences(id).ideal;
        match self.layout[id.idx as usize].as_deref() {
            Some(layout) => layout.ideal_size(&self.layout_children(id.into()), stored),
            None => stored,
        }
    }

    /// Minimum size, consulting the node's layout when it has one.
    #[must_use]
    pub fn minimum_size(&self, id: NodeId) -> Size {
        let stored = self.size_preferences(id).minimum;
        match self.layout[id.idx as usize].as_deref() {
            Some(layout) => layout.minimum_size(&self.layout_children(id.into()), stored),
            None => stored,
        }
    }

    /// Snapshot of a container's children for its layout.
    pub(crate) fn layout_children(&self, container: Container) -> Vec<LayoutChild> {
        self.children_of(container)
            .iter()
            .map(|&c| {
                let i = c.idx as usize;
                LayoutChild::new(
                    c,
                    self.bounds[i],
                    self.visible[i],
                    self.z_order[i],
                    SizePreferences {
                        ideal: self.ideal_size(c),
                        minimum: self.minimum_size(c),
                    },
                )
            })
            .collect()
    }
}

fn is_empty(r: Rect) -> bool {
    !(r.width() > 0.0 && r.height() > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::layout::{Layout, simple_layout};
    use crate::node::{ClipPath, ContentDirection};
    use alloc::boxed::Box;
    use alloc::vec;
    use core::f64::consts::FRAC_PI_4;
    use kurbo::Insets;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    fn tree(direction: ContentDirection) -> (NodeStore, NodeId, NodeId) {
        let mut s = NodeStore::new(Size::new(200.0, 200.0), direction, true);
        let a = s.create_node();
        let b = s.create_node();
        s.apply_children(Container::Display, vec![a]).unwrap();
        s.apply_children(a.into(), vec![b]).unwrap();
        s.set_bounds(a, Rect::new(20.0, 30.0, 120.0, 130.0));
        s.set_bounds(b, Rect::new(10.0, 10.0, 50.0, 30.0));
        s.resolve_mirroring();
        (s, a, b)
    }

    #[test]
    fn absolute_round_trip_with_rotation() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        s.set_transform(a, Transform3d::from_rotation_z(FRAC_PI_4));
        let p = Point::new(3.0, 4.0);
        let abs = s.to_absolute(b, p);
        assert!(close(s.from_absolute(b, abs).unwrap(), p));
    }

    #[test]
    fn mirrored_child_round_trips_and_hits() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        s.set_content_direction(b, Some(ContentDirection::RightToLeft));
        s.resolve_mirroring();
        assert!(s.needs_mirror_transform(b));

        // Local x = 5 lands 5 units in from the right edge.
        let abs = s.to_absolute(b, Point::new(5.0, 5.0));
        assert!(close(abs, Point::new(20.0 + 50.0 - 5.0, 30.0 + 15.0)));
        assert!(close(s.from_absolute(b, abs).unwrap(), Point::new(5.0, 5.0)));
        assert_eq!(s.node_at(abs), Some(b));
    }

    #[test]
    fn to_local_paths_agree() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        s.set_transform(b, Transform3d::from_scale(2.0, 2.0, 1.0));
        let p = Point::new(15.0, 12.0);
        let via_parent = s.to_local(b, p, Some(a)).unwrap();
        let via_display = s.to_local(b, s.to_absolute(a, p), None).unwrap();
        assert!(close(via_parent, via_display));
        assert_eq!(s.to_local(b, p, Some(b)), Some(p));
    }

    #[test]
    fn projected_child_round_trips() {
        let (mut s, _, b) = tree(ContentDirection::LeftToRight);
        s.set_transform(b, Transform3d::from_rotation_y(0.5));
        s.set_camera(b, Some(Camera::new(Point::new(30.0, 20.0), 400.0)));
        let p = Point::new(7.0, 9.0);
        let abs = s.to_absolute(b, p);
        assert!(close(s.from_absolute(b, abs).unwrap(), p));
    }

    #[test]
    fn hits_follow_the_projected_plane() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        s.set_transform(b, Transform3d::from_rotation_y(0.9));
        s.set_camera(b, Some(Camera::new(Point::new(30.0, 20.0), 400.0)));
        assert!(!s.projected_transform(b).is_2d());

        let inside = s.to_absolute(b, Point::new(35.0, 15.0));
        assert_eq!(s.node_at(inside), Some(b));

        // Foreshortened into b's untransformed box, but past its right edge.
        let beyond = s.to_absolute(b, Point::new(45.0, 10.0));
        let in_a = s.from_absolute(a, beyond).unwrap();
        assert!(s.bounds(b).contains(in_a));
        assert!(!s.contains(b, in_a));
        assert_eq!(s.node_at(beyond), Some(a));
        assert_eq!(s.hit_test(a, beyond), Some(a));
    }

    #[test]
    fn higher_z_wins_and_later_child_breaks_ties() {
        let mut s = NodeStore::new(Size::new(100.0, 100.0), ContentDirection::LeftToRight, true);
        let root = s.create_node();
        let (x, y, z) = (s.create_node(), s.create_node(), s.create_node());
        s.apply_children(Container::Display, vec![root]).unwrap();
        s.apply_children(root.into(), vec![x, y, z]).unwrap();
        s.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        for n in [x, y, z] {
            s.set_bounds(n, Rect::new(0.0, 0.0, 50.0, 50.0));
        }
        assert_eq!(s.child_at(root, Point::new(10.0, 10.0)), Some(z));
        s.set_z_order(x, 1);
        assert_eq!(s.child_at(root, Point::new(10.0, 10.0)), Some(x));
        s.set_visible(x, false);
        assert_eq!(s.child_at(root, Point::new(10.0, 10.0)), Some(z));
    }

    #[test]
    fn children_clip_blocks_lookup() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        s.set_children_clip(a, Some(ClipPath::from_rect(Rect::new(0.0, 0.0, 15.0, 15.0))));
        assert_eq!(s.child_at(a, Point::new(12.0, 12.0)), Some(b));
        assert_eq!(s.child_at(a, Point::new(40.0, 20.0)), None);
        assert_eq!(s.hit_test(a, Point::new(60.0, 50.0)), Some(a));
    }

    #[test]
    fn layout_lookup_overrides_scan() {
        struct Nothing;
        impl Layout for Nothing {
            fn layout(&self, _: &mut [LayoutChild], _: Size, c: Size, _: Size, _: Insets) -> Size {
                c
            }
            fn locate_child(&self, _: &[LayoutChild], _: Point) -> LookupResult {
                LookupResult::Empty
            }
        }
        let (mut s, a, _) = tree(ContentDirection::LeftToRight);
        s.set_layout(a, Some(Box::new(Nothing)));
        assert_eq!(s.child_at(a, Point::new(12.0, 12.0)), None);
    }

    #[test]
    fn display_rect_is_clipped_by_ancestors() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        assert_eq!(s.display_rect(b), Rect::new(0.0, 0.0, 40.0, 20.0));
        // Push b half outside a.
        s.set_bounds(b, Rect::new(80.0, 10.0, 120.0, 30.0));
        assert_eq!(s.display_rect(b), Rect::new(0.0, 0.0, 20.0, 20.0));
        // Push a partly off the display.
        s.set_bounds(a, Rect::new(150.0, 0.0, 250.0, 100.0));
        assert_eq!(s.display_rect(a), Rect::new(0.0, 0.0, 50.0, 100.0));
        assert_eq!(s.display_rect(b), Rect::ZERO);
        s.set_bounds(a, Rect::new(0.0, 0.0, 100.0, 100.0));
        s.set_visible(a, false);
        assert_eq!(s.display_rect(b), Rect::ZERO);
    }

    #[test]
    fn size_queries_consult_layout() {
        let (mut s, a, b) = tree(ContentDirection::LeftToRight);
        s.set_size_preferences(
            b,
            SizePreferences {
                ideal: Some(Size::new(30.0, 10.0)),
                minimum: Size::new(5.0, 5.0),
            },
        );
        assert_eq!(s.ideal_size(a), None);
        s.set_layout(a, Some(Box::new(crate::layout::FillLayout)));
        assert_eq!(s.ideal_size(a), Some(Size::new(30.0, 10.0)));
        s.set_layout(a, Some(simple_layout(|_, c, _| c)));
        assert_eq!(s.minimum_size(a), Size::ZERO);
    }
}

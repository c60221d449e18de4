// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout protocol.
//!
//! A container node may install a [`Layout`]. The render manager invokes it
//! whenever the container is in the pending-layout set, handing it a snapshot
//! of the children as [`LayoutChild`] values. Bounds the layout assigns are
//! written back through the normal node setters, so a layout pass produces the
//! same notifications as any other mutation.
//!
//! Preferred sizes flow bottom-up through [`Layout::ideal_size`] and
//! [`Layout::minimum_size`]; child bounds flow top-down through
//! [`Layout::layout`]. The size a layout returns for its container is clamped
//! into `[min, max]` before it is applied.

mod flow;

pub use flow::{HorizontalFlowLayout, Justification, VerticalAlignment};

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Insets, Point, Rect, Size};

use crate::node::NodeId;

/// A node's size hints.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SizePreferences {
    /// Preferred size, if the node has one.
    pub ideal: Option<Size>,
    /// Smallest acceptable size.
    pub minimum: Size,
}

/// What a layout found at a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupResult {
    /// This child is under the point.
    Found(NodeId),
    /// Nothing is under the point; do not fall back to a scan.
    Empty,
    /// The layout does not do lookups; scan the children by z-order.
    Ignored,
}

/// A child as seen by its container's layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutChild {
    id: NodeId,
    bounds: Rect,
    visible: bool,
    z_order: i32,
    preferences: SizePreferences,
}

impl LayoutChild {
    pub(crate) fn new(
        id: NodeId,
        bounds: Rect,
        visible: bool,
        z_order: i32,
        preferences: SizePreferences,
    ) -> Self {
        Self {
            id,
            bounds,
            visible,
            z_order,
            preferences,
        }
    }

    /// The child's handle.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current bounds in the container's coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Replaces the bounds.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Point {
        self.bounds.origin()
    }

    /// Moves the child, keeping its size.
    pub fn set_position(&mut self, position: Point) {
        self.bounds = Rect::from_origin_size(position, self.bounds.size());
    }

    /// Current size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.bounds.size()
    }

    /// Resizes the child, keeping its position.
    pub fn set_size(&mut self, size: Size) {
        self.bounds = Rect::from_origin_size(self.bounds.origin(), size);
    }

    /// Whether the child is visible. Layouts usually skip invisible children.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// The child's z-order.
    #[must_use]
    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    /// Preferred size, resolved through the child's own layout.
    #[must_use]
    pub fn ideal_size(&self) -> Option<Size> {
        self.preferences.ideal
    }

    /// Minimum size, resolved through the child's own layout.
    #[must_use]
    pub fn minimum_size(&self) -> Size {
        self.preferences.minimum
    }
}

/// A strategy that positions a container's children.
///
/// Only [`layout`](Self::layout) is required. The `requires_layout_*` hooks
/// let a layout opt out of passes it does not need.
pub trait Layout: Send {
    /// Assigns child bounds and returns the container's new size.
    ///
    /// `current` is the container's size before the pass; the result is
    /// clamped into `[min, max]`.
    fn layout(
        &self,
        children: &mut [LayoutChild],
        min: Size,
        current: Size,
        max: Size,
        insets: Insets,
    ) -> Size;

    /// Finds the child under `at`, in the container's local coordinates.
    fn locate_child(&self, children: &[LayoutChild], at: Point) -> LookupResult {
        _ = (children, at);
        LookupResult::Ignored
    }

    /// Whether a container resize from `old` to `new` needs a pass.
    fn requires_layout_for_size(&self, old: Size, new: Size) -> bool {
        _ = (old, new);
        true
    }

    /// Whether a child's bounds change needs a pass.
    fn requires_layout_for_child_bounds(&self, child: NodeId, old: Rect, new: Rect) -> bool {
        _ = (child, old, new);
        true
    }

    /// Whether a child's size preferences change needs a pass.
    fn requires_layout_for_preferences(
        &self,
        child: NodeId,
        old: &SizePreferences,
        new: &SizePreferences,
    ) -> bool {
        _ = (child, old, new);
        false
    }

    /// The container's preferred size given its children.
    fn ideal_size(&self, children: &[LayoutChild], default: Option<Size>) -> Option<Size> {
        _ = children;
        default
    }

    /// The container's minimum size given its children.
    fn minimum_size(&self, children: &[LayoutChild], default: Size) -> Size {
        _ = children;
        default
    }
}

impl fmt::Debug for dyn Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Layout")
    }
}

/// Clamps `size` into `[min, max]` per axis.
///
/// `min` wins when the range is inverted; a NaN component becomes `min`.
#[must_use]
pub fn clamp_size(size: Size, min: Size, max: Size) -> Size {
    fn axis(v: f64, lo: f64, hi: f64) -> f64 {
        let v = if v.is_nan() { lo } else { v };
        v.min(hi).max(lo)
    }
    Size::new(
        axis(size.width, min.width, max.width),
        axis(size.height, min.height, max.height),
    )
}

/// A layout built from a closure.
///
/// Every hook other than [`Layout::layout`] keeps its default.
pub fn simple_layout<F>(f: F) -> Box<dyn Layout>
where
    F: Fn(&mut [LayoutChild], Size, Insets) -> Size + Send + 'static,
{
    Box::new(SimpleLayout(f))
}

struct SimpleLayout<F>(F);

impl<F> Layout for SimpleLayout<F>
where
    F: Fn(&mut [LayoutChild], Size, Insets) -> Size + Send,
{
    fn layout(
        &self,
        children: &mut [LayoutChild],
        _min: Size,
        current: Size,
        _max: Size,
        insets: Insets,
    ) -> Size {
        (self.0)(children, current, insets)
    }
}

/// Fills the container with every visible child.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillLayout;

impl Layout for FillLayout {
    fn layout(
        &self,
        children: &mut [LayoutChild],
        _min: Size,
        current: Size,
        _max: Size,
        insets: Insets,
    ) -> Size {
        let area = Rect::from_origin_size(Point::ZERO, current) - insets;
        for child in children.iter_mut().filter(|c| c.visible()) {
            child.set_bounds(area);
        }
        current
    }

    fn requires_layout_for_child_bounds(&self, _child: NodeId, _old: Rect, _new: Rect) -> bool {
        false
    }

    fn ideal_size(&self, children: &[LayoutChild], default: Option<Size>) -> Option<Size> {
        children
            .iter()
            .filter(|c| c.visible())
            .filter_map(LayoutChild::ideal_size)
            .reduce(|a, b| Size::new(a.width.max(b.width), a.height.max(b.height)))
            .or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn child(idx: u32, bounds: Rect) -> LayoutChild {
        LayoutChild::new(
            NodeId { idx, generation: 0 },
            bounds,
            true,
            0,
            SizePreferences::default(),
        )
    }

    #[test]
    fn clamp_corrects_out_of_range_results() {
        let min = Size::new(10.0, 10.0);
        let max = Size::new(100.0, 50.0);
        assert_eq!(clamp_size(Size::new(5.0, 500.0), min, max), Size::new(10.0, 50.0));
        assert_eq!(clamp_size(Size::new(f64::NAN, 20.0), min, max), Size::new(10.0, 20.0));
        let unbounded = Size::new(f64::INFINITY, f64::INFINITY);
        assert_eq!(clamp_size(Size::new(1e9, 3.0), Size::ZERO, unbounded), Size::new(1e9, 3.0));
    }

    #[test]
    fn inverted_range_prefers_minimum() {
        let s = clamp_size(Size::new(30.0, 30.0), Size::new(40.0, 40.0), Size::new(20.0, 20.0));
        assert_eq!(s, Size::new(40.0, 40.0));
    }

    #[test]
    fn fill_layout_respects_insets() {
        let mut children = vec![child(0, Rect::ZERO), child(1, Rect::ZERO)];
        let size = FillLayout.layout(
            &mut children,
            Size::ZERO,
            Size::new(100.0, 80.0),
            Size::new(f64::INFINITY, f64::INFINITY),
            Insets::uniform(5.0),
        );
        assert_eq!(size, Size::new(100.0, 80.0));
        for c in &children {
            assert_eq!(c.bounds(), Rect::new(5.0, 5.0, 95.0, 75.0));
        }
    }

    #[test]
    fn default_hooks() {
        let layout = simple_layout(|_, current, _| current);
        let id = NodeId { idx: 0, generation: 0 };
        assert!(layout.requires_layout_for_size(Size::ZERO, Size::new(1.0, 1.0)));
        assert!(layout.requires_layout_for_child_bounds(id, Rect::ZERO, Rect::ZERO));
        assert!(!layout.requires_layout_for_preferences(
            id,
            &SizePreferences::default(),
            &SizePreferences::default()
        ));
        assert_eq!(layout.locate_child(&[], Point::ZERO), LookupResult::Ignored);
        assert_eq!(layout.minimum_size(&[], Size::new(3.0, 4.0)), Size::new(3.0, 4.0));
    }

    #[test]
    fn layout_child_position_and_size_are_independent() {
        let mut c = child(0, Rect::new(1.0, 2.0, 11.0, 22.0));
        c.set_position(Point::new(5.0, 5.0));
        assert_eq!(c.bounds(), Rect::new(5.0, 5.0, 15.0, 25.0));
        c.set_size(Size::new(1.0, 1.0));
        assert_eq!(c.bounds(), Rect::new(5.0, 5.0, 6.0, 6.0));
    }
}

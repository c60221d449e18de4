// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation and property management.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Insets, Point, Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker};

use crate::camera::Camera;
use crate::display::Display;
use crate::event::{NodeEvents, PropertyChange};
use crate::layout::{Layout, SizePreferences};
use crate::transform::Transform3d;

use super::ContentDirection;
use super::clip::ClipPath;
use super::id::{Anchor, INVALID, NodeId};

/// Struct-of-arrays storage for all nodes, plus the display they hang from.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays. Destroyed nodes are recycled through a free list, and
/// generation counters reject stale handles.
///
/// Property setters here only update state and fire the node's own event
/// channels; they return the previous value when something changed so the
/// caller can forward the change to the render manager.
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<NodeId>>,
    pub(crate) anchor: Vec<Anchor>,

    // -- Authored properties --
    pub(crate) bounds: Vec<Rect>,
    pub(crate) transform: Vec<Transform3d>,
    pub(crate) camera: Vec<Option<Camera>>,
    pub(crate) visible: Vec<bool>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) z_order: Vec<i32>,
    pub(crate) clip_canvas_to_bounds: Vec<bool>,
    pub(crate) children_clip: Vec<Option<ClipPath>>,
    pub(crate) ideal_size: Vec<Option<Size>>,
    pub(crate) minimum_size: Vec<Size>,
    pub(crate) content_direction: Vec<Option<ContentDirection>>,
    pub(crate) mirror_when_right_to_left: Vec<bool>,
    pub(crate) monitors_display_rect: Vec<bool>,
    pub(crate) insets: Vec<Insets>,
    pub(crate) layout: Vec<Option<Box<dyn Layout>>>,

    // -- Computed properties --
    pub(crate) bounding_box: Vec<Rect>,
    pub(crate) resolved_direction: Vec<ContentDirection>,
    pub(crate) needs_mirror: Vec<bool>,
    pub(crate) displayed: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Mirror propagation --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Observers --
    pub(crate) events: Vec<Option<Box<NodeEvents>>>,

    pub(crate) display: Display,
}

impl fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeStore")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

impl NodeStore {
    /// Creates an empty store whose display has the given size and direction.
    #[must_use]
    pub fn new(
        display_size: Size,
        content_direction: ContentDirection,
        mirror_when_right_to_left: bool,
    ) -> Self {
        Self {
            parent: Vec::new(),
            children: Vec::new(),
            anchor: Vec::new(),
            bounds: Vec::new(),
            transform: Vec::new(),
            camera: Vec::new(),
            visible: Vec::new(),
            opacity: Vec::new(),
            z_order: Vec::new(),
            clip_canvas_to_bounds: Vec::new(),
            children_clip: Vec::new(),
            ideal_size: Vec::new(),
            minimum_size: Vec::new(),
            content_direction: Vec::new(),
            mirror_when_right_to_left: Vec::new(),
            monitors_display_rect: Vec::new(),
            insets: Vec::new(),
            layout: Vec::new(),
            bounding_box: Vec::new(),
            resolved_direction: Vec::new(),
            needs_mirror: Vec::new(),
            displayed: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            events: Vec::new(),
            display: Display::new(display_size, content_direction, mirror_when_right_to_left),
        }
    }

    // -- Allocation API --

    /// Creates a detached node and returns its handle.
    ///
    /// The node starts with empty bounds, an identity transform, full
    /// opacity, visible, no clip, and no layout.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.anchor[i] = Anchor::None;
            self.bounds[i] = Rect::ZERO;
            self.transform[i] = Transform3d::IDENTITY;
            self.camera[i] = None;
            self.visible[i] = true;
            self.opacity[i] = 1.0;
            self.z_order[i] = 0;
            self.clip_canvas_to_bounds[i] = true;
            self.children_clip[i] = None;
            self.ideal_size[i] = None;
            self.minimum_size[i] = Size::ZERO;
            self.content_direction[i] = None;
            self.mirror_when_right_to_left[i] = true;
            self.monitors_display_rect[i] = false;
            self.insets[i] = Insets::ZERO;
            self.layout[i] = None;
            self.bounding_box[i] = Rect::ZERO;
            self.resolved_direction[i] = ContentDirection::LeftToRight;
            self.needs_mirror[i] = false;
            self.displayed[i] = false;
            self.alive[i] = true;
            self.events[i] = None;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.anchor.push(Anchor::None);
            self.bounds.push(Rect::ZERO);
            self.transform.push(Transform3d::IDENTITY);
            self.camera.push(None);
            self.visible.push(true);
            self.opacity.push(1.0);
            self.z_order.push(0);
            self.clip_canvas_to_bounds.push(true);
            self.children_clip.push(None);
            self.ideal_size.push(None);
            self.minimum_size.push(Size::ZERO);
            self.content_direction.push(None);
            self.mirror_when_right_to_left.push(true);
            self.monitors_display_rect.push(false);
            self.insets.push(Insets::ZERO);
            self.layout.push(None);
            self.bounding_box.push(Rect::ZERO);
            self.resolved_direction.push(ContentDirection::LeftToRight);
            self.needs_mirror.push(false);
            self.displayed.push(false);
            self.generation.push(0);
            self.alive.push(true);
            self.events.push(None);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees a detached, childless node's slot.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or the node still has a parent,
    /// children, or an anchor.
    pub(crate) fn free_node(&mut self, id: NodeId) {
        self.validate(id);
        let i = id.idx as usize;
        assert!(self.parent[i] == INVALID, "cannot free node with a parent");
        assert!(self.children[i].is_empty(), "cannot free node with children");
        assert!(self.anchor[i] == Anchor::None, "cannot free anchored node");

        self.dirty.remove_key(id.idx);
        self.layout[i] = None;
        self.events[i] = None;
        self.children_clip[i] = None;
        self.alive[i] = false;
        self.generation[i] += 1;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Whether no node is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds a handle for a live slot.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Asserts that `id` is live.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[inline]
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(self.is_alive(id), "stale NodeId {id:?}");
    }

    // -- Display --

    /// The root display.
    #[must_use]
    pub fn display(&self) -> &Display {
        &self.display
    }

    pub(crate) fn display_mut(&mut self) -> &mut Display {
        &mut self.display
    }

    // -- Getters --

    /// Bounds in the parent's coordinate space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn bounds(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Top-left corner of the bounds.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Point {
        self.bounds(id).origin()
    }

    /// Size of the bounds.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Size {
        self.bounds(id).size()
    }

    /// Bounds mapped through the resolved (and projected) transform.
    #[must_use]
    pub fn bounding_box(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.bounding_box[id.idx as usize]
    }

    /// Authored transform.
    #[must_use]
    pub fn transform(&self, id: NodeId) -> Transform3d {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Camera, if any.
    #[must_use]
    pub fn camera(&self, id: NodeId) -> Option<Camera> {
        self.validate(id);
        self.camera[id.idx as usize]
    }

    /// The node's own visibility flag.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Whether the node and every ancestor are visible.
    #[must_use]
    pub fn recursively_visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.recursively_visible_idx(id.idx)
    }

    pub(crate) fn recursively_visible_idx(&self, mut idx: u32) -> bool {
        loop {
            if !self.visible[idx as usize] {
                return false;
            }
            let p = self.parent[idx as usize];
            if p == INVALID {
                return true;
            }
            idx = p;
        }
    }

    /// Opacity in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self, id: NodeId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Z-order among siblings.
    #[must_use]
    pub fn z_order(&self, id: NodeId) -> i32 {
        self.validate(id);
        self.z_order[id.idx as usize]
    }

    /// Whether painting is clipped to the node's bounds.
    #[must_use]
    pub fn clip_canvas_to_bounds(&self, id: NodeId) -> bool {
        self.validate(id);
        self.clip_canvas_to_bounds[id.idx as usize]
    }

    /// Path clipping the node's children, in local coordinates.
    #[must_use]
    pub fn children_clip(&self, id: NodeId) -> Option<&ClipPath> {
        self.validate(id);
        self.children_clip[id.idx as usize].as_ref()
    }

    /// The stored size hints, ignoring any layout.
    #[must_use]
    pub fn size_preferences(&self, id: NodeId) -> SizePreferences {
        self.validate(id);
        SizePreferences {
            ideal: self.ideal_size[id.idx as usize],
            minimum: self.minimum_size[id.idx as usize],
        }
    }

    /// Local content-direction override.
    #[must_use]
    pub fn local_content_direction(&self, id: NodeId) -> Option<ContentDirection> {
        self.validate(id);
        self.content_direction[id.idx as usize]
    }

    /// Content direction after inheritance.
    #[must_use]
    pub fn content_direction(&self, id: NodeId) -> ContentDirection {
        self.validate(id);
        self.resolved_direction[id.idx as usize]
    }

    /// Whether the node mirrors when right-to-left.
    #[must_use]
    pub fn mirror_when_right_to_left(&self, id: NodeId) -> bool {
        self.validate(id);
        self.mirror_when_right_to_left[id.idx as usize]
    }

    /// Whether the node is mirrored: right-to-left and willing to mirror.
    #[must_use]
    pub fn mirrored(&self, id: NodeId) -> bool {
        self.validate(id);
        self.mirrored_idx(id.idx)
    }

    pub(crate) fn mirrored_idx(&self, idx: u32) -> bool {
        self.resolved_direction[idx as usize] == ContentDirection::RightToLeft
            && self.mirror_when_right_to_left[idx as usize]
    }

    /// Whether the resolved transform includes a horizontal flip.
    #[must_use]
    pub fn needs_mirror_transform(&self, id: NodeId) -> bool {
        self.validate(id);
        self.needs_mirror[id.idx as usize]
    }

    /// Whether the node asks for display-rect notifications.
    #[must_use]
    pub fn monitors_display_rect(&self, id: NodeId) -> bool {
        self.validate(id);
        self.monitors_display_rect[id.idx as usize]
    }

    /// Insets handed to the node's layout.
    #[must_use]
    pub fn insets(&self, id: NodeId) -> Insets {
        self.validate(id);
        self.insets[id.idx as usize]
    }

    /// Whether a layout is installed.
    #[must_use]
    pub fn has_layout(&self, id: NodeId) -> bool {
        self.validate(id);
        self.layout[id.idx as usize].is_some()
    }

    /// Whether the node is currently attached to the display.
    #[must_use]
    pub fn displayed(&self, id: NodeId) -> bool {
        self.validate(id);
        self.displayed[id.idx as usize]
    }

    /// Whether the node is shown as a popup.
    #[must_use]
    pub fn is_popup(&self, id: NodeId) -> bool {
        self.validate(id);
        self.anchor[id.idx as usize] == Anchor::Popup
    }

    /// The node's event channels, allocated on first use.
    pub fn events_mut(&mut self, id: NodeId) -> &mut NodeEvents {
        self.validate(id);
        self.events[id.idx as usize].get_or_insert_with(Box::default)
    }

    pub(crate) fn with_events(&mut self, idx: u32, f: impl FnOnce(&mut NodeEvents)) {
        if let Some(events) = self.events[idx as usize].as_deref_mut() {
            f(events);
        }
    }

    // -- Setters --
    //
    // Each returns the previous value when the stored value changed and
    // `None` for a no-op. Equality is exact.

    /// Replaces the bounds, recomputing the bounding box.
    pub(crate) fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> Option<Rect> {
        self.validate(id);
        let i = id.idx as usize;
        let old = self.bounds[i];
        if old == bounds {
            return None;
        }
        self.bounds[i] = bounds;
        self.update_bounding_box(id.idx);
        self.with_events(id.idx, |e| {
            e.bounds.notify(&PropertyChange {
                node: id,
                old,
                new: bounds,
            });
        });
        Some(old)
    }

    /// Replaces the authored transform.
    pub(crate) fn set_transform(
        &mut self,
        id: NodeId,
        transform: Transform3d,
    ) -> Option<Transform3d> {
        self.validate(id);
        let i = id.idx as usize;
        let old = self.transform[i];
        if old == transform {
            return None;
        }
        self.transform[i] = transform;
        self.update_bounding_box(id.idx);
        self.with_events(id.idx, |e| {
            e.transform.notify(&PropertyChange {
                node: id,
                old,
                new: transform,
            });
        });
        Some(old)
    }

    /// Replaces the camera.
    pub(crate) fn set_camera(
        &mut self,
        id: NodeId,
        camera: Option<Camera>,
    ) -> Option<Option<Camera>> {
        self.validate(id);
        let i = id.idx as usize;
        let old = self.camera[i];
        if old == camera {
            return None;
        }
        self.camera[i] = camera;
        self.update_bounding_box(id.idx);
        self.with_events(id.idx, |e| {
            e.camera.notify(&PropertyChange {
                node: id,
                old,
                new: camera,
            });
        });
        Some(old)
    }

    /// Sets the visibility flag.
    pub(crate) fn set_visible(&mut self, id: NodeId, visible: bool) -> Option<bool> {
        self.validate(id);
        let i = id.idx as usize;
        let old = self.visible[i];
        if old == visible {
            return None;
        }
        self.visible[i] = visible;
        self.with_events(id.idx, |e| {
            e.visible.notify(&PropertyChange {
                node: id,
                old,
                new: visible,
            });
        });
        Some(old)
    }

    /// Sets the opacity, clamped to `[0, 1]`. NaN is ignored.
    pub(crate) fn set_opacity(&mut self, id: NodeId, opacity: f32) -> Option<f32> {
        self.validate(id);
        if opacity.is_nan() {
            return None;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        let i = id.idx as usize;
        let old = self.opacity[i];
        if old == opacity {
            return None;
        }
        self.opacity[i] = opacity;
        self.with_events(id.idx, |e| {
            e.opacity.notify(&PropertyChange {
                node: id,
                old,
                new: opacity,
            });
        });
        Some(old)
    }

    /// Sets the z-order.
    pub(crate) fn set_z_order(&mut self, id: NodeId, z_order: i32) -> Option<i32> {
        self.validate(id);
        let i = id.idx as usize;
        let old = self.z_order[i];
        if old == z_order {
            return None;
        }
        self.z_order[i] = z_order;
        self.with_events(id.idx, |e| {
            e.z_order.notify(&PropertyChange {
                node: id,
                old,
                new: z_order,
            });
        });
        Some(old)
    }

    /// Sets whether painting is clipped to bounds.
    pub(crate) fn set_clip_canvas_to_bounds(&mut self, id: NodeId, clip: bool) -> Option<bool> {
        self.validate(id);
        let slot = &mut self.clip_canvas_to_bounds[id.idx as usize];
        (*slot != clip).then(|| core::mem::replace(slot, clip))
    }

    /// Replaces the children clip path.
    pub(crate) fn set_children_clip(
        &mut self,
        id: NodeId,
        clip: Option<ClipPath>,
    ) -> Option<Option<ClipPath>> {
        self.validate(id);
        let slot = &mut self.children_clip[id.idx as usize];
        (*slot != clip).then(|| core::mem::replace(slot, clip))
    }

    /// Replaces the ideal and minimum size hints together.
    pub(crate) fn set_size_preferences(
        &mut self,
        id: NodeId,
        preferences: SizePreferences,
    ) -> Option<SizePreferences> {
        self.validate(id);
        let old = self.size_preferences(id);
        if old == preferences {
            return None;
        }
        let i = id.idx as usize;
        self.ideal_size[i] = preferences.ideal;
        self.minimum_size[i] = preferences.minimum;
        self.with_events(id.idx, |e| {
            e.size_preferences.notify(&PropertyChange {
                node: id,
                old,
                new: preferences,
            });
        });
        Some(old)
    }

    /// Sets the display-rect monitoring flag.
    pub(crate) fn set_monitors_display_rect(&mut self, id: NodeId, monitors: bool) -> Option<bool> {
        self.validate(id);
        let slot = &mut self.monitors_display_rect[id.idx as usize];
        (*slot != monitors).then(|| core::mem::replace(slot, monitors))
    }

    /// Replaces the insets.
    pub(crate) fn set_insets(&mut self, id: NodeId, insets: Insets) -> Option<Insets> {
        self.validate(id);
        let slot = &mut self.insets[id.idx as usize];
        (*slot != insets).then(|| core::mem::replace(slot, insets))
    }

    /// Installs or removes the layout. Always counts as a change.
    pub(crate) fn set_layout(&mut self, id: NodeId, layout: Option<Box<dyn Layout>>) {
        self.validate(id);
        self.layout[id.idx as usize] = layout;
    }

    pub(crate) fn set_displayed(&mut self, idx: u32, displayed: bool) {
        let old = core::mem::replace(&mut self.displayed[idx as usize], displayed);
        if old != displayed {
            let node = self.id_at(idx);
            self.with_events(idx, |e| {
                e.displayed.notify(&PropertyChange {
                    node,
                    old,
                    new: displayed,
                });
            });
        }
    }

    /// Recomputes the cached bounding box. Returns `true` if it changed.
    pub(crate) fn update_bounding_box(&mut self, idx: u32) -> bool {
        let bounds = self.bounds[idx as usize];
        let bbox = self.projected_transform_idx(idx).map_rect(bounds);
        let slot = &mut self.bounding_box[idx as usize];
        if *slot == bbox {
            return false;
        }
        *slot = bbox;
        true
    }
}

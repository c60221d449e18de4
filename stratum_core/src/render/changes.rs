// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation handlers.
//!
//! The scene's setters update the [`NodeStore`](crate::node::NodeStore) and
//! then call in here with the old and new values. Handlers only record work;
//! the backend is touched at the next flush.

use alloc::vec::Vec;

use kurbo::{Rect, Size};
use understory_dirty::Channel;

use crate::device::SurfaceFactory;
use crate::dirty;
use crate::event::ChildrenChange;
use crate::layout::SizePreferences;
use crate::node::{Container, NodeId};
use crate::scene::Scene;

/// Whether a rect has no paintable area.
pub(crate) fn is_empty(r: Rect) -> bool {
    !(r.width() > 0.0 && r.height() > 0.0)
}

fn differs(a: Size, b: Size, epsilon: f64) -> bool {
    (a.width - b.width).abs() > epsilon || (a.height - b.height).abs() > epsilon
}

impl<F: SurfaceFactory> Scene<F> {
    /// Requests a frame unless the flush is already running.
    pub(crate) fn schedule_paint(&self) {
        if !self.manager.painting {
            self.invalidator.request_frame();
        }
    }

    /// Marks `id` for repaint. Returns whether it was accepted.
    ///
    /// Only registered, displayed nodes can be marked; empty nodes are
    /// skipped unless `ignore_empty` is set.
    pub(crate) fn render_node(&mut self, id: NodeId, ignore_empty: bool) -> bool {
        if !self.store.is_alive(id)
            || !self.manager.views.contains(&id)
            || !self.store.displayed(id)
            || (!ignore_empty && is_empty(self.store.bounds(id)))
        {
            return false;
        }
        self.manager.dirty.insert(id);
        self.manager.pending_render.insert(id);
        self.schedule_paint();
        true
    }

    /// Queues a layout of `container`, unless it is the one laying out now.
    pub(crate) fn schedule_layout(&mut self, container: Container) {
        if self.manager.laying_out == Some(container) {
            return;
        }
        if let Container::Node(id) = container
            && !self.store.is_alive(id)
        {
            return;
        }
        if self.manager.pending_layout.insert(container) {
            self.schedule_paint();
        }
    }

    /// Queues a surface property push for a registered node.
    pub(crate) fn surface_property_changed(&mut self, id: NodeId, channel: Channel) {
        if !self.manager.views.contains(&id) {
            return;
        }
        self.manager.mark_property(id, channel);
        self.schedule_paint();
    }

    /// Replaces bounds and forwards the change.
    pub(crate) fn apply_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(old) = self.store.set_bounds(id, bounds) {
            self.bounds_changed(id, old, bounds);
        }
    }

    pub(crate) fn bounds_changed(&mut self, id: NodeId, old: Rect, new: Rect) {
        if !self.store.is_attached(id) || !self.store.visible(id) {
            return;
        }
        self.manager.pending_bounds.insert(id);

        let (old_size, new_size) = (old.size(), new.size());
        let resized = old_size != new_size;
        if resized
            && !self.store.children(id).is_empty()
            && self.store.layout[id.idx as usize]
                .as_deref()
                .is_some_and(|l| l.requires_layout_for_size(old_size, new_size))
        {
            let this = Container::Node(id);
            if self.manager.laying_out != Some(this) {
                self.schedule_layout(this);
            } else if differs(old_size, new_size, self.config.layout_epsilon) {
                self.perform_layout(this);
            } else {
                return;
            }
        }

        match self.store.parent(id) {
            Some(p) => {
                if self.store.layout[p.idx as usize]
                    .as_deref()
                    .is_some_and(|l| l.requires_layout_for_child_bounds(id, old, new))
                {
                    self.schedule_layout(Container::Node(p));
                }
            }
            None if !self.store.is_popup(id) => {
                if self
                    .store
                    .display
                    .layout
                    .as_deref()
                    .is_some_and(|l| l.requires_layout_for_child_bounds(id, old, new))
                {
                    self.schedule_layout(Container::Display);
                }
            }
            None => {}
        }

        if !resized || !self.render_node(id, true) {
            self.schedule_paint();
        }
    }

    pub(crate) fn visibility_changed(&mut self, id: NodeId, visible: bool) {
        let was_invisible = self.manager.added_invisible.remove(&id);
        if was_invisible {
            self.record(id);
        }
        if !self.store.is_attached(id) {
            return;
        }

        match self.store.parent(id) {
            Some(p) => {
                self.schedule_layout(Container::Node(p));
                if visible {
                    self.manager.pending_bounds.insert(id);
                }
                self.manager.visibility_changed.insert(id);
                self.manager.pending_render.insert(id);
                self.render_node(p, false);
            }
            None => {
                self.manager.visibility_changed.insert(id);
                if visible {
                    self.manager.pending_bounds.insert(id);
                    if !was_invisible {
                        self.render_node(id, false);
                    }
                } else {
                    self.manager.pending_bounds.remove(&id);
                }
                if !self.store.is_popup(id) {
                    self.schedule_layout(Container::Display);
                }
            }
        }

        if visible {
            self.resume_hidden_descendants(id);
        }
        self.check_display_rect(id);
        self.schedule_paint();
    }

    /// Requeues registered descendants that were skipped while hidden.
    fn resume_hidden_descendants(&mut self, id: NodeId) {
        let waiting: Vec<NodeId> = self
            .store
            .subtree(id)
            .into_iter()
            .filter(|n| {
                self.manager.views.contains(n)
                    && (self.manager.dirty.contains(n) || self.manager.never_rendered.contains(n))
            })
            .collect();
        self.manager.pending_render.extend(waiting);
    }

    pub(crate) fn size_preferences_changed(
        &mut self,
        id: NodeId,
        old: &SizePreferences,
        new: &SizePreferences,
    ) {
        if !self.store.is_attached(id) || !self.store.visible(id) {
            return;
        }
        let (container, layout) = match self.store.parent(id) {
            Some(p) => (Container::Node(p), self.store.layout[p.idx as usize].as_deref()),
            None if !self.store.is_popup(id) => {
                (Container::Display, self.store.display.layout.as_deref())
            }
            None => return,
        };
        if layout.is_some_and(|l| l.requires_layout_for_preferences(id, old, new)) {
            self.schedule_layout(container);
        }
    }

    /// Forwards one children change: events, registration, index pushes,
    /// and a relayout of the container.
    pub(crate) fn children_changed(&mut self, change: &ChildrenChange) {
        let container = change.container;

        for &child in change.diff.removed.values() {
            self.child_removed(container, child);
            if self.store.container_of(child).is_none() {
                let origin = Rect::from_origin_size(kurbo::Point::ZERO, self.store.size(child));
                self.apply_bounds(child, origin);
                if self.store.set_z_order(child, 0).is_some() {
                    self.surface_property_changed(child, dirty::Z_ORDER);
                }
            }
        }

        match container {
            Container::Display => self.store.display.events.children.notify(change),
            Container::Node(c) => self.store.with_events(c.idx, |e| e.children.notify(change)),
        }

        for &child in change.diff.added.values() {
            self.child_added(container, child);
        }
        for &(_, child) in change.diff.moved.values() {
            if !self.manager.pending_render.contains(&child) {
                self.surface_property_changed(child, dirty::INDEX);
            }
        }

        match container {
            Container::Node(c) => {
                self.schedule_layout(container);
                if self.store.visible(c) {
                    self.render_node(c, false);
                }
            }
            Container::Display => {
                if !change.diff.added.is_empty() || !change.diff.removed.is_empty() {
                    self.schedule_layout(Container::Display);
                }
            }
        }
    }

    /// Resolves pending content-direction changes and rerenders every node
    /// whose mirror flip changed.
    pub(crate) fn mirroring_changed(&mut self) {
        for id in self.store.resolve_mirroring() {
            self.surface_property_changed(id, dirty::TRANSFORM);
            self.manager.pending_bounds.insert(id);
            self.render_node(id, false);
        }
    }

    /// The display was resized.
    pub(crate) fn display_resized(&mut self, old: Size, new: Size) {
        self.store.display.events.size.notify(&(old, new));
        self.schedule_layout(Container::Display);
        let top: Vec<NodeId> = self.store.display.children.clone();
        for id in top {
            self.check_display_rect(id);
        }
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monitored display rectangles.
//!
//! A node that monitors its display rect is entered into a sparse tree
//! together with every ancestor up to its root. Geometry changes are checked
//! top-down through that tree: a node's rect can only change if its own
//! bounds changed or its parent's rect did.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::device::SurfaceFactory;
use crate::event::PropertyChange;
use crate::node::NodeId;
use crate::scene::Scene;

use super::DisplayRectNode;

impl<F: SurfaceFactory> Scene<F> {
    /// Enters `id` into the tree and reports its initial rect.
    pub(crate) fn start_monitoring(&mut self, id: NodeId) {
        self.register_display_rect(id);
        self.check_display_rect(id);
    }

    fn register_display_rect(&mut self, id: NodeId) {
        if self.manager.display_rects.contains_key(&id) {
            return;
        }
        let parent = self.store.parent(id);
        self.manager.display_rects.insert(
            id,
            DisplayRectNode {
                rect: Rect::ZERO,
                parent,
                children: Vec::new(),
            },
        );
        if let Some(p) = parent {
            self.register_display_rect(p);
            if let Some(node) = self.manager.display_rects.get_mut(&p) {
                node.children.push(id);
            }
        }
    }

    /// Removes `id` from the tree once nothing below it is monitored,
    /// then prunes ancestors that are only there for `id`.
    pub(crate) fn stop_monitoring(&mut self, id: NodeId) {
        let Some(node) = self.manager.display_rects.get(&id) else {
            return;
        };
        if !node.children.is_empty() {
            return;
        }
        let parent = node.parent;
        self.manager.display_rects.remove(&id);
        let Some(p) = parent else {
            return;
        };
        if let Some(node) = self.manager.display_rects.get_mut(&p) {
            node.children.retain(|c| *c != id);
        }
        if !(self.store.is_alive(p) && self.store.monitors_display_rect(p)) {
            self.stop_monitoring(p);
        }
    }

    /// Recomputes the rect of `id` and, if it changed, notifies and
    /// rechecks the monitored subtree.
    pub(crate) fn check_display_rect(&mut self, id: NodeId) {
        let Some(node) = self.manager.display_rects.get(&id) else {
            return;
        };
        let old = node.rect;
        let new = if self.store.is_alive(id) {
            self.store.display_rect(id)
        } else {
            Rect::ZERO
        };
        if old == new {
            return;
        }
        let children = node.children.clone();
        if let Some(node) = self.manager.display_rects.get_mut(&id) {
            node.rect = new;
        }
        if self.store.is_alive(id) && self.store.monitors_display_rect(id) {
            self.store.with_events(id.idx, |e| {
                e.display_rect.notify(&PropertyChange { node: id, old, new });
            });
        }
        for child in children {
            self.check_display_rect(child);
        }
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration and release.
//!
//! A node is *recorded* when it (or an ancestor) joins the display. Removal
//! only drops the subtree from the living set and files it under its old
//! container's cleanup list; the next flush releases whatever is still
//! there. Re-adding a node before that flush pulls it back off the list and
//! keeps its surface.

use alloc::vec::Vec;

use crate::device::SurfaceFactory;
use crate::dirty;
use crate::node::{Container, NodeId};
use crate::scene::Scene;

impl<F: SurfaceFactory> Scene<F> {
    /// Registers `id` and its visible descendants for rendering.
    pub(crate) fn record(&mut self, id: NodeId) {
        if !self.manager.living.contains(&id)
            && let Some(p) = self.store.parent(id)
            && !self.manager.views.contains(&p)
        {
            self.record(p);
            return;
        }

        let fresh = self.manager.views.insert(id);
        self.manager.living.insert(id);

        if self.store.is_attached(id) {
            self.store.set_displayed(id.idx, true);
            if fresh {
                if let Some(a11y) = self.accessibility.as_mut() {
                    a11y.node_attached(id);
                }
                self.manager.mark_unrendered(id);
            } else {
                self.manager.pending_render.insert(id);
                self.manager.pending_bounds.insert(id);
                self.manager.mark_property(id, dirty::INDEX);
                self.manager.mark_property(id, dirty::Z_ORDER);
            }
            if !self.store.recursively_visible(id) {
                self.manager.added_invisible.insert(id);
            }
        }

        if fresh && let Some(theme) = self.theme.as_mut() {
            theme.update(id);
        }

        let children = self.store.children(id).to_vec();
        for &child in &children {
            self.child_added(Container::Node(id), child);
        }
        if !children.is_empty() {
            self.schedule_layout(Container::Node(id));
        }

        if self.store.monitors_display_rect(id) {
            self.start_monitoring(id);
        }

        if self.store.parent(id).is_none() {
            self.render_node(id, true);
        }
        self.schedule_paint();
    }

    /// `child` joined `container`.
    pub(crate) fn child_added(&mut self, container: Container, child: NodeId) {
        if let Container::Node(c) = container
            && !self.store.is_attached(c)
        {
            return;
        }

        if let Some(owner) = self.manager.cleanup_owner(child) {
            self.manager.remove_cleanup_entry(owner, child);
            if owner != container {
                self.release_resources(owner, child);
            }
        }

        if self.store.visible(child) {
            self.record(child);
        } else {
            self.manager.added_invisible.insert(child);
        }
    }

    /// `child` left `container`.
    pub(crate) fn child_removed(&mut self, container: Container, child: NodeId) {
        for n in self.store.subtree(child) {
            self.manager.living.remove(&n);
            self.manager.added_invisible.remove(&n);
        }
        if self.manager.views.contains(&child) {
            self.manager.add_to_cleanup(container, child);
            self.schedule_paint();
        }
    }

    /// Unregisters `id` and everything below it that is not living, queueing
    /// their surfaces for release.
    pub(crate) fn release_resources(&mut self, container: Container, id: NodeId) {
        if self.manager.living.contains(&id) || !self.manager.views.contains(&id) {
            self.manager.remove_cleanup_entry(container, id);
            return;
        }

        let alive = self.store.is_alive(id);
        if alive {
            self.store.set_displayed(id.idx, false);
        }
        if let Some(a11y) = self.accessibility.as_mut() {
            a11y.node_detached(id);
        }
        // Parents first; releasing a surface takes its cached children along.
        self.manager.pending_release.push(id);

        let children: Vec<NodeId> = if alive {
            self.store.children(id).to_vec()
        } else {
            Vec::new()
        };
        for child in children {
            self.release_resources(Container::Node(id), child);
        }
        if let Some(orphans) = self.manager.pending_cleanup.remove(&Container::Node(id)) {
            for orphan in orphans {
                self.release_resources(Container::Node(id), orphan);
            }
        }

        self.manager.forget(id);
        self.manager.remove_cleanup_entry(container, id);
        self.stop_monitoring(id);
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render/layout coordination.
//!
//! The render manager is a state machine over sets of nodes. Every mutation
//! class lands in exactly one place:
//!
//! | Mutation                        | Recorded in                          |
//! |---------------------------------|--------------------------------------|
//! | needs repaint                   | `dirty` (+ `pending_render`)         |
//! | children need a layout pass     | `pending_layout`                     |
//! | bounds changed                  | `pending_bounds`                     |
//! | attached, not painted yet       | `never_rendered` / `added_invisible` |
//! | removed this frame              | `pending_cleanup`, keyed by container|
//! | visibility flipped              | `visibility_changed`                 |
//! | transform/opacity/z/index/clip  | `understory_dirty` channels          |
//!
//! Nothing here touches the backend. The frame flush in [`frame`] drains the
//! sets in a fixed order: layout, cleanup, attach, sync, paint.
//!
//! The algorithms live in `impl Scene` blocks split by concern:
//!
//! - `changes`: mutation handlers called by the scene's setters.
//! - `record`: attachment, removal, and resource release.
//! - `layout`: applying a container's layout.
//! - `display_rect`: monitored display rectangles.
//! - `frame`: the per-frame flush.

mod changes;
mod display_rect;
mod frame;
mod layout;
mod record;


use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::Rect;
use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::node::{Container, NodeId};

/// A monitored node's place in the display-rect tree.
#[derive(Clone, Debug, Default)]
pub(crate) struct DisplayRectNode {
    /// Last rect reported, in the node's local coordinates.
    pub(crate) rect: Rect,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Per-frame bookkeeping.
#[derive(Debug)]
pub(crate) struct RenderManager {
    /// Nodes registered for rendering.
    pub(crate) views: HashSet<NodeId>,
    /// Registered nodes still reachable from the display. Removal drops a
    /// subtree from here immediately; release happens at the next cleanup.
    pub(crate) living: HashSet<NodeId>,
    pub(crate) dirty: HashSet<NodeId>,
    pub(crate) never_rendered: HashSet<NodeId>,
    pub(crate) pending_render: HashSet<NodeId>,
    pub(crate) pending_bounds: HashSet<NodeId>,
    pub(crate) visibility_changed: HashSet<NodeId>,
    pub(crate) added_invisible: HashSet<NodeId>,
    pub(crate) pending_layout: HashSet<Container>,
    pub(crate) pending_cleanup: HashMap<Container, Vec<NodeId>>,
    /// Surfaces to release at the next cleanup.
    pub(crate) pending_release: Vec<NodeId>,
    pub(crate) display_rects: HashMap<NodeId, DisplayRectNode>,
    /// Surface property deltas, keyed by slot index.
    pub(crate) tracker: DirtyTracker<u32>,
    /// Whether `tracker` has marks not yet drained.
    pub(crate) properties_dirty: bool,
    pub(crate) laying_out: Option<Container>,
    /// Nesting of synchronous layouts.
    pub(crate) layout_depth: u32,
    pub(crate) painting: bool,
    pub(crate) frame_index: u64,
}

impl RenderManager {
    pub(crate) fn new() -> Self {
        Self {
            views: HashSet::new(),
            living: HashSet::new(),
            dirty: HashSet::new(),
            never_rendered: HashSet::new(),
            pending_render: HashSet::new(),
            pending_bounds: HashSet::new(),
            visibility_changed: HashSet::new(),
            added_invisible: HashSet::new(),
            pending_layout: HashSet::new(),
            pending_cleanup: HashMap::new(),
            pending_release: Vec::new(),
            display_rects: HashMap::new(),
            tracker: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            properties_dirty: false,
            laying_out: None,
            layout_depth: 0,
            painting: false,
            frame_index: 0,
        }
    }

    /// Marks a registered node as needing its initial surface state.
    pub(crate) fn mark_unrendered(&mut self, id: NodeId) {
        self.dirty.insert(id);
        self.never_rendered.insert(id);
        self.pending_render.insert(id);
        self.pending_bounds.insert(id);
    }

    /// Queues a push of one surface property.
    pub(crate) fn mark_property(&mut self, id: NodeId, channel: Channel) {
        self.tracker.mark(id.idx, channel);
        self.properties_dirty = true;
    }

    /// Drops a node from every per-node set.
    pub(crate) fn forget(&mut self, id: NodeId) {
        self.views.remove(&id);
        self.living.remove(&id);
        self.dirty.remove(&id);
        self.never_rendered.remove(&id);
        self.pending_render.remove(&id);
        self.pending_bounds.remove(&id);
        self.visibility_changed.remove(&id);
        self.added_invisible.remove(&id);
        self.pending_layout.remove(&Container::Node(id));
        self.tracker.remove_key(id.idx);
    }

    /// Adds `child` to the cleanup list of `container`.
    pub(crate) fn add_to_cleanup(&mut self, container: Container, child: NodeId) {
        let list = self.pending_cleanup.entry(container).or_default();
        if !list.contains(&child) {
            list.push(child);
        }
    }

    /// Removes `child` from the cleanup list of `container`.
    pub(crate) fn remove_cleanup_entry(&mut self, container: Container, child: NodeId) {
        if let Some(list) = self.pending_cleanup.get_mut(&container) {
            list.retain(|c| *c != child);
            if list.is_empty() {
                self.pending_cleanup.remove(&container);
            }
        }
    }

    /// Finds the container whose cleanup list holds `child`.
    pub(crate) fn cleanup_owner(&self, child: NodeId) -> Option<Container> {
        self.pending_cleanup
            .iter()
            .find(|(_, list)| list.contains(&child))
            .map(|(container, _)| *container)
    }

    /// Whether any per-frame work is queued.
    pub(crate) fn has_pending_work(&self) -> bool {
        !self.pending_layout.is_empty()
            || !self.pending_render.is_empty()
            || !self.pending_bounds.is_empty()
            || !self.pending_cleanup.is_empty()
            || !self.pending_release.is_empty()
            || !self.visibility_changed.is_empty()
            || self.properties_dirty
    }
}

#[cfg(test)]
mod manager_tests {
    use super::*;

    fn id(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn cleanup_lists_drop_empty_entries() {
        let mut m = RenderManager::new();
        let parent = Container::Node(id(0));
        m.add_to_cleanup(parent, id(1));
        m.add_to_cleanup(parent, id(1));
        assert_eq!(m.pending_cleanup[&parent], [id(1)]);
        assert_eq!(m.cleanup_owner(id(1)), Some(parent));
        m.remove_cleanup_entry(parent, id(1));
        assert!(m.pending_cleanup.is_empty());
        assert_eq!(m.cleanup_owner(id(1)), None);
    }

    #[test]
    fn forget_scrubs_every_set() {
        let mut m = RenderManager::new();
        let n = id(3);
        m.views.insert(n);
        m.living.insert(n);
        m.mark_unrendered(n);
        m.visibility_changed.insert(n);
        m.pending_layout.insert(Container::Node(n));
        m.forget(n);
        assert!(!m.has_pending_work());
        assert!(m.views.is_empty() && m.dirty.is_empty() && m.never_rendered.is_empty());
    }
}

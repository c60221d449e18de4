// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content direction inheritance and mirror resolution.
//!
//! A node is mirrored when its resolved direction is right-to-left and it
//! allows mirroring. Surfaces nest, so the flip is applied only where a node's
//! mirrored state differs from its parent's; the cached `needs_mirror` flag
//! records exactly that.

use alloc::vec::Vec;

use understory_dirty::EagerPolicy;

use crate::dirty;
use crate::event::PropertyChange;

use super::ContentDirection;
use super::id::{Anchor, INVALID, NodeId};
use super::store::NodeStore;

impl NodeStore {
    /// Sets or clears the local direction override.
    pub(crate) fn set_content_direction(
        &mut self,
        id: NodeId,
        direction: Option<ContentDirection>,
    ) -> Option<Option<ContentDirection>> {
        self.validate(id);
        let slot = &mut self.content_direction[id.idx as usize];
        if *slot == direction {
            return None;
        }
        let old = core::mem::replace(slot, direction);
        self.dirty.mark_with(id.idx, dirty::MIRROR, &EagerPolicy);
        Some(old)
    }

    /// Sets whether the node mirrors when right-to-left.
    pub(crate) fn set_mirror_when_right_to_left(&mut self, id: NodeId, mirror: bool) -> Option<bool> {
        self.validate(id);
        let slot = &mut self.mirror_when_right_to_left[id.idx as usize];
        if *slot == mirror {
            return None;
        }
        let old = core::mem::replace(slot, mirror);
        self.dirty.mark_with(id.idx, dirty::MIRROR, &EagerPolicy);
        Some(old)
    }

    /// Sets the display's direction and marks every top-level node.
    pub(crate) fn set_display_content_direction(&mut self, direction: ContentDirection) -> bool {
        if self.display.content_direction == direction {
            return false;
        }
        self.display.content_direction = direction;
        self.mark_display_roots();
        true
    }

    /// Sets whether the display mirrors and marks every top-level node.
    pub(crate) fn set_display_mirror_when_right_to_left(&mut self, mirror: bool) -> bool {
        if self.display.mirror_when_right_to_left == mirror {
            return false;
        }
        self.display.mirror_when_right_to_left = mirror;
        self.mark_display_roots();
        true
    }

    fn mark_display_roots(&mut self) {
        let roots: Vec<u32> = self
            .display
            .children
            .iter()
            .chain(&self.display.popups)
            .map(|id| id.idx)
            .collect();
        for idx in roots {
            self.dirty.mark_with(idx, dirty::MIRROR, &EagerPolicy);
        }
    }

    /// Direction and mirrored state a node inherits.
    fn inherited(&self, idx: u32) -> (ContentDirection, bool) {
        let p = self.parent[idx as usize];
        if p != INVALID {
            (self.resolved_direction[p as usize], self.mirrored_idx(p))
        } else if self.anchor[idx as usize] != Anchor::None {
            (self.display.content_direction, self.display.mirrored())
        } else {
            (ContentDirection::LeftToRight, false)
        }
    }

    /// Recomputes direction and mirror flags for every marked node.
    ///
    /// Fires content-direction events for nodes whose resolved direction
    /// changed. Returns the nodes whose mirror flip changed; their resolved
    /// transform is different now.
    pub(crate) fn resolve_mirroring(&mut self) -> Vec<NodeId> {
        let mut marked: Vec<u32> = self
            .dirty
            .drain(dirty::MIRROR)
            .affected()
            .deterministic()
            .run()
            .filter(|idx| *idx < self.len && self.alive[*idx as usize])
            .collect();
        marked.sort_by_key(|idx| (self.depth_idx(*idx), *idx));

        let mut flipped = Vec::new();
        for idx in marked {
            let i = idx as usize;
            let (parent_direction, parent_mirrored) = self.inherited(idx);
            let direction = self.content_direction[i].unwrap_or(parent_direction);
            let old = core::mem::replace(&mut self.resolved_direction[i], direction);
            if old != direction {
                let node = self.id_at(idx);
                self.with_events(idx, |e| {
                    e.content_direction.notify(&PropertyChange {
                        node,
                        old,
                        new: direction,
                    });
                });
            }
            let needs = self.mirrored_idx(idx) != parent_mirrored;
            if self.needs_mirror[i] != needs {
                self.needs_mirror[i] = needs;
                self.update_bounding_box(idx);
                flipped.push(self.id_at(idx));
            }
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Container;
    use alloc::sync::Arc;
    use alloc::vec;
    use kurbo::{Rect, Size};
    use std::sync::Mutex;

    fn rtl_store() -> NodeStore {
        NodeStore::new(Size::new(100.0, 100.0), ContentDirection::RightToLeft, true)
    }

    #[test]
    fn top_level_node_flips_once() {
        let mut s = rtl_store();
        let a = s.create_node();
        let b = s.create_node();
        s.apply_children(Container::Display, vec![a]).unwrap();
        s.apply_children(a.into(), vec![b]).unwrap();
        s.resolve_mirroring();
        assert_eq!(s.content_direction(b), ContentDirection::RightToLeft);
        assert!(s.mirrored(a));
        // The display is mirrored too, so nothing flips relative to it.
        assert!(!s.needs_mirror_transform(a));
        assert!(!s.needs_mirror_transform(b));
    }

    #[test]
    fn opting_out_flips_the_node_and_its_children() {
        let mut s = rtl_store();
        let (a, b, c) = (s.create_node(), s.create_node(), s.create_node());
        s.apply_children(Container::Display, vec![a]).unwrap();
        s.apply_children(a.into(), vec![b]).unwrap();
        s.apply_children(b.into(), vec![c]).unwrap();
        s.resolve_mirroring();

        s.set_mirror_when_right_to_left(b, false);
        let flipped = s.resolve_mirroring();
        assert_eq!(flipped, vec![b, c]);
        assert!(s.needs_mirror_transform(b));
        // c mirrors again relative to its unmirrored parent.
        assert!(s.needs_mirror_transform(c));
    }

    #[test]
    fn override_propagates_to_inheriting_children() {
        let mut s = NodeStore::new(Size::new(100.0, 100.0), ContentDirection::LeftToRight, true);
        let (a, b) = (s.create_node(), s.create_node());
        s.apply_children(Container::Display, vec![a]).unwrap();
        s.apply_children(a.into(), vec![b]).unwrap();
        s.resolve_mirroring();

        let seen = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();
        s.events_mut(b)
            .content_direction
            .subscribe(move |e| sink.lock().unwrap().push(e.new));

        s.set_content_direction(a, Some(ContentDirection::RightToLeft));
        let flipped = s.resolve_mirroring();
        assert_eq!(flipped, vec![a]);
        assert_eq!(*seen.lock().unwrap(), vec![ContentDirection::RightToLeft]);
    }

    #[test]
    fn flip_updates_bounding_box() {
        let mut s = NodeStore::new(Size::new(100.0, 100.0), ContentDirection::LeftToRight, true);
        let (a, b) = (s.create_node(), s.create_node());
        s.apply_children(Container::Display, vec![a]).unwrap();
        s.apply_children(a.into(), vec![b]).unwrap();
        s.set_bounds(b, Rect::new(10.0, 0.0, 30.0, 10.0));
        s.set_transform(b, crate::transform::Transform3d::from_translation(5.0, 0.0, 0.0));
        s.set_content_direction(b, Some(ContentDirection::RightToLeft));
        s.resolve_mirroring();
        assert!(s.needs_mirror_transform(b));
        // Flipping about the bounds center leaves the box in place.
        assert_eq!(s.bounding_box(b), Rect::new(15.0, 0.0, 35.0, 10.0));
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{Anchor, INVALID, NodeId};
use super::store::NodeStore;

/// An iterator over the ancestors of a node, nearest first.
///
/// Created by [`NodeStore::ancestors`]. The node itself is not yielded.
#[derive(Debug)]
pub struct Ancestors<'a> {
    store: &'a NodeStore,
    current: u32,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.parent[idx as usize];
        Some(self.store.id_at(idx))
    }
}

impl NodeStore {
    /// Iterates the ancestors of `id`, nearest first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors {
            store: self,
            current: self.parent[id.idx as usize],
        }
    }

    /// The parent node, or `None` for top-level, popup, and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.validate(id);
        &self.children[id.idx as usize]
    }

    /// The topmost ancestor of `id`, or `id` itself.
    #[must_use]
    pub fn root(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Number of ancestors. Top-level nodes have depth 0.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub(crate) fn depth_idx(&self, mut idx: u32) -> usize {
        let mut depth = 0;
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
            depth += 1;
        }
        depth
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Whether `id` hangs from the display, directly or through ancestors.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.validate(id);
        let root = self.root(id);
        self.anchor[root.idx as usize] != Anchor::None
    }

    /// Collects `id` and every descendant in pre-order.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        self.validate(id);
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children[n.idx as usize].iter().rev().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ContentDirection;
    use alloc::vec;
    use kurbo::Size;

    fn chain() -> (NodeStore, NodeId, NodeId, NodeId) {
        let mut s = NodeStore::new(Size::new(100.0, 100.0), ContentDirection::LeftToRight, true);
        let a = s.create_node();
        let b = s.create_node();
        let c = s.create_node();
        s.apply_children(a.into(), vec![b]).unwrap();
        s.apply_children(b.into(), vec![c]).unwrap();
        (s, a, b, c)
    }

    #[test]
    fn ancestors_nearest_first() {
        let (s, a, b, c) = chain();
        assert_eq!(s.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(s.depth(c), 2);
        assert_eq!(s.depth_idx(c.idx), 2);
        assert_eq!(s.root(c), a);
        assert_eq!(s.parent(a), None);
    }

    #[test]
    fn ancestry_checks() {
        let (s, a, b, c) = chain();
        assert!(s.is_ancestor_or_self(a, c));
        assert!(s.is_ancestor_or_self(c, c));
        assert!(!s.is_ancestor_or_self(c, b));
    }

    #[test]
    fn subtree_is_preorder() {
        let (mut s, a, b, c) = chain();
        let d = s.create_node();
        s.apply_children(a.into(), vec![b, d]).unwrap();
        assert_eq!(s.subtree(a), vec![a, b, c, d]);
    }

    #[test]
    fn attachment_follows_root_anchor() {
        let (mut s, a, _, c) = chain();
        assert!(!s.is_attached(c));
        s.apply_children(crate::node::Container::Display, vec![a])
            .unwrap();
        assert!(s.is_attached(c));
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Children list mutation and validation.

use alloc::vec::Vec;

use crate::dirty;
use crate::error::SceneError;
use crate::event::{ChildrenChange, ChildrenDiff};

use super::id::{Anchor, Container, INVALID, NodeId};
use super::store::NodeStore;

impl NodeStore {
    /// The children list of `container`.
    ///
    /// # Panics
    ///
    /// Panics if the container is a stale node.
    #[must_use]
    pub fn children_of(&self, container: Container) -> &[NodeId] {
        match container {
            Container::Display => &self.display.children,
            Container::Node(id) => self.children(id),
        }
    }

    /// The container currently holding `id`, if any.
    ///
    /// Popups have no container.
    #[must_use]
    pub fn container_of(&self, id: NodeId) -> Option<Container> {
        self.validate(id);
        let i = id.idx as usize;
        if self.parent[i] != INVALID {
            return Some(Container::Node(self.id_at(self.parent[i])));
        }
        (self.anchor[i] == Anchor::Display).then_some(Container::Display)
    }

    /// Checks a handle without panicking.
    pub(crate) fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(SceneError::StaleNode(id))
        }
    }

    /// Checks that `child` may be placed under `container`.
    pub(crate) fn check_insert(&self, container: Container, child: NodeId) -> Result<(), SceneError> {
        self.check(child)?;
        if let Container::Node(c) = container {
            self.check(c)?;
            if c == child {
                return Err(SceneError::CannotAddToSelf(child));
            }
            if self.ancestors(c).any(|a| a == child) {
                return Err(SceneError::CannotAddAncestor {
                    ancestor: child,
                    descendant: c,
                });
            }
        }
        Ok(())
    }

    /// Replaces the children of `container` with `new`.
    ///
    /// Every node in `new` is validated before anything changes. A node that
    /// belongs to another container (or is shown as a popup) is detached from
    /// it first. Duplicates in `new` keep their first occurrence.
    ///
    /// Returns the children changes in the order they happened: detachments
    /// from other containers first, then the change to `container`. An empty
    /// vector means nothing changed.
    pub(crate) fn apply_children(
        &mut self,
        container: Container,
        new: Vec<NodeId>,
    ) -> Result<Vec<ChildrenChange>, SceneError> {
        if let Container::Node(c) = container {
            self.check(c)?;
        }
        let mut list: Vec<NodeId> = Vec::with_capacity(new.len());
        for id in new {
            self.check_insert(container, id)?;
            if !list.contains(&id) {
                list.push(id);
            }
        }

        let mut changes = Vec::new();

        // Detach incoming nodes from wherever they live now.
        for &id in &list {
            if self.anchor[id.idx as usize] == Anchor::Popup {
                self.detach_popup(id);
                continue;
            }
            match self.container_of(id) {
                Some(from) if from != container => {
                    let old = self.children_of(from).to_vec();
                    let remaining: Vec<NodeId> = old.iter().copied().filter(|c| *c != id).collect();
                    self.unlink(from, id);
                    self.store_list(from, remaining.clone());
                    changes.push(ChildrenChange {
                        container: from,
                        diff: ChildrenDiff::between(&old, &remaining),
                    });
                }
                _ => {}
            }
        }

        let old = self.children_of(container).to_vec();
        let diff = ChildrenDiff::between(&old, &list);
        if diff.is_empty() {
            return Ok(changes);
        }
        for &id in diff.removed.values() {
            self.unlink(container, id);
        }
        for &id in diff.added.values() {
            self.link(container, id);
        }
        self.store_list(container, list);
        changes.push(ChildrenChange { container, diff });
        Ok(changes)
    }

    fn store_list(&mut self, container: Container, list: Vec<NodeId>) {
        match container {
            Container::Display => self.display.children = list,
            Container::Node(c) => self.children[c.idx as usize] = list,
        }
    }

    fn link(&mut self, container: Container, id: NodeId) {
        let i = id.idx as usize;
        match container {
            Container::Display => {
                self.parent[i] = INVALID;
                self.anchor[i] = Anchor::Display;
            }
            Container::Node(p) => {
                self.parent[i] = p.idx;
                self.anchor[i] = Anchor::None;
                let added = self.dirty.add_dependency(id.idx, p.idx, dirty::MIRROR);
                debug_assert!(added.is_ok(), "check_insert rules out mirror cycles");
            }
        }
        self.dirty.mark_with(id.idx, dirty::MIRROR, &understory_dirty::EagerPolicy);
    }

    fn unlink(&mut self, container: Container, id: NodeId) {
        let i = id.idx as usize;
        if let Container::Node(p) = container {
            self.dirty.remove_dependency(id.idx, p.idx, dirty::MIRROR);
        }
        self.parent[i] = INVALID;
        self.anchor[i] = Anchor::None;
        self.dirty.mark_with(id.idx, dirty::MIRROR, &understory_dirty::EagerPolicy);
    }

    /// Frees a detached node and its whole subtree, deepest first.
    ///
    /// Returns the freed handles in pre-order.
    pub(crate) fn destroy_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let nodes = self.subtree(id);
        for &n in nodes.iter().rev() {
            let i = n.idx as usize;
            if self.parent[i] != INVALID {
                self.dirty.remove_dependency(n.idx, self.parent[i], dirty::MIRROR);
            }
            self.children[i].clear();
            self.parent[i] = INVALID;
            self.free_node(n);
        }
        nodes
    }

    /// Anchors a detached node as a popup.
    pub(crate) fn attach_popup(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.check(id)?;
        let i = id.idx as usize;
        if self.parent[i] != INVALID || self.anchor[i] != Anchor::None {
            return Err(SceneError::NotDetached(id));
        }
        self.anchor[i] = Anchor::Popup;
        self.display.popups.push(id);
        self.dirty.mark_with(id.idx, dirty::MIRROR, &understory_dirty::EagerPolicy);
        Ok(())
    }

    /// Removes a node from the popup list.
    pub(crate) fn detach_popup(&mut self, id: NodeId) -> bool {
        let i = id.idx as usize;
        if self.anchor[i] != Anchor::Popup {
            return false;
        }
        self.anchor[i] = Anchor::None;
        self.display.popups.retain(|p| *p != id);
        self.dirty.mark_with(id.idx, dirty::MIRROR, &understory_dirty::EagerPolicy);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ContentDirection;
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use kurbo::Size;

    fn store() -> NodeStore {
        NodeStore::new(Size::new(100.0, 100.0), ContentDirection::LeftToRight, true)
    }

    #[test]
    fn rejects_self_and_ancestor() {
        let mut s = store();
        let a = s.create_node();
        let b = s.create_node();
        assert_eq!(
            s.apply_children(a.into(), vec![a]),
            Err(SceneError::CannotAddToSelf(a))
        );
        s.apply_children(a.into(), vec![b]).unwrap();
        assert_eq!(
            s.apply_children(b.into(), vec![a]),
            Err(SceneError::CannotAddAncestor {
                ancestor: a,
                descendant: b
            })
        );
        assert_eq!(s.children(b), &[] as &[NodeId]);
    }

    #[test]
    fn inverting_a_chain_drops_the_old_edges() {
        let mut s = store();
        let (a, b, c) = (s.create_node(), s.create_node(), s.create_node());
        s.apply_children(a.into(), vec![b]).unwrap();
        s.apply_children(b.into(), vec![c]).unwrap();

        s.apply_children(Container::Display, vec![c]).unwrap();
        s.apply_children(c.into(), vec![a]).unwrap();
        assert_eq!(s.parent(a), Some(c));
        assert_eq!(s.parent(b), Some(a));
        assert_eq!(s.parent(c), None);
        assert_eq!(s.ancestors(b).collect::<Vec<_>>(), [a, c]);
    }

    #[test]
    fn rejects_stale_child_without_partial_change() {
        let mut s = store();
        let a = s.create_node();
        let b = s.create_node();
        let gone = s.create_node();
        s.free_node(gone);
        assert_eq!(
            s.apply_children(a.into(), vec![b, gone]),
            Err(SceneError::StaleNode(gone))
        );
        assert!(s.children(a).is_empty());
        assert_eq!(s.parent(b), None);
    }

    #[test]
    fn moving_between_containers_reports_both_lists() {
        let mut s = store();
        let (a, b, c) = (s.create_node(), s.create_node(), s.create_node());
        s.apply_children(a.into(), vec![c]).unwrap();
        let changes = s.apply_children(b.into(), vec![c]).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].container, Container::Node(a));
        assert_eq!(changes[0].diff.removed, BTreeMap::from([(0, c)]));
        assert_eq!(changes[1].container, Container::Node(b));
        assert_eq!(changes[1].diff.added, BTreeMap::from([(0, c)]));
        assert_eq!(s.parent(c), Some(b));
        assert!(s.children(a).is_empty());
    }

    #[test]
    fn display_children_are_anchored() {
        let mut s = store();
        let a = s.create_node();
        s.apply_children(Container::Display, vec![a]).unwrap();
        assert_eq!(s.container_of(a), Some(Container::Display));
        assert_eq!(s.display().children(), &[a]);
        s.apply_children(Container::Display, vec![]).unwrap();
        assert_eq!(s.container_of(a), None);
    }

    #[test]
    fn unchanged_list_reports_nothing() {
        let mut s = store();
        let (a, b) = (s.create_node(), s.create_node());
        s.apply_children(a.into(), vec![b]).unwrap();
        assert!(s.apply_children(a.into(), vec![b, b]).unwrap().is_empty());
    }

    #[test]
    fn popup_must_be_detached() {
        let mut s = store();
        let (a, b) = (s.create_node(), s.create_node());
        s.apply_children(a.into(), vec![b]).unwrap();
        assert_eq!(s.attach_popup(b), Err(SceneError::NotDetached(b)));
        s.attach_popup(a).unwrap();
        assert!(s.is_popup(a));
        assert!(s.is_attached(b));
        assert!(s.detach_popup(a));
        assert!(!s.detach_popup(a));
        assert!(s.display().popups().is_empty());
    }
}

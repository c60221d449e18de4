// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed change notifications.
//!
//! Every observable node property has its own [`Observers`] channel carrying a
//! [`PropertyChange`] with the old and new value. Children mutations carry an
//! explicit [`ChildrenDiff`] instead of before/after snapshots.
//!
//! Listeners run synchronously inside the mutating call and receive only the
//! event payload; they cannot reach back into the scene.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};

use crate::camera::Camera;
use crate::layout::SizePreferences;
use crate::node::{Container, ContentDirection, NodeId};
use crate::transform::Transform3d;

/// Handle returned by [`Observers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A property changed from `old` to `new` on `node`.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange<T> {
    /// The node whose property changed.
    pub node: NodeId,
    /// Value before the change.
    pub old: T,
    /// Value after the change.
    pub new: T,
}

/// The result of one children mutation.
///
/// Indices in `removed` refer to the old list, indices in `added` to the new
/// list. `moved` maps a new index to the old index of a node present in both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildrenDiff {
    /// Nodes no longer in the list, by old index.
    pub removed: BTreeMap<usize, NodeId>,
    /// Nodes new to the list, by new index.
    pub added: BTreeMap<usize, NodeId>,
    /// Nodes whose index changed: new index → (old index, node).
    pub moved: BTreeMap<usize, (usize, NodeId)>,
}

impl ChildrenDiff {
    /// Computes the diff between two children lists.
    #[must_use]
    pub fn between(old: &[NodeId], new: &[NodeId]) -> Self {
        let mut diff = Self::default();
        for (i, id) in old.iter().enumerate() {
            if !new.contains(id) {
                diff.removed.insert(i, *id);
            }
        }
        for (i, id) in new.iter().enumerate() {
            match old.iter().position(|o| o == id) {
                None => {
                    diff.added.insert(i, *id);
                }
                Some(from) if from != i => {
                    diff.moved.insert(i, (from, *id));
                }
                Some(_) => {}
            }
        }
        diff
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.moved.is_empty()
    }
}

/// A children mutation on `container`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildrenChange {
    /// The container whose list changed.
    pub container: Container,
    /// What changed.
    pub diff: ChildrenDiff,
}

type Listener<E> = Box<dyn FnMut(&E) + Send>;

/// A list of listeners for one event type.
pub struct Observers<E> {
    next: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next: 0,
            listeners: Vec::new(),
        }
    }
}

impl<E> Observers<E> {
    /// Registers a listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `event` to every listener in subscription order.
    pub fn notify(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

/// All event channels of one node.
///
/// Allocated lazily the first time anything subscribes.
#[derive(Debug, Default)]
pub struct NodeEvents {
    /// Bounds changed.
    pub bounds: Observers<PropertyChange<Rect>>,
    /// Authored transform changed.
    pub transform: Observers<PropertyChange<Transform3d>>,
    /// Camera changed.
    pub camera: Observers<PropertyChange<Option<Camera>>>,
    /// Visibility changed.
    pub visible: Observers<PropertyChange<bool>>,
    /// Opacity changed.
    pub opacity: Observers<PropertyChange<f32>>,
    /// Z-order changed.
    pub z_order: Observers<PropertyChange<i32>>,
    /// Ideal or minimum size changed.
    pub size_preferences: Observers<PropertyChange<SizePreferences>>,
    /// Children list changed.
    pub children: Observers<ChildrenChange>,
    /// Visible on-screen rectangle changed (monitored nodes only).
    pub display_rect: Observers<PropertyChange<Rect>>,
    /// Resolved content direction changed.
    pub content_direction: Observers<PropertyChange<ContentDirection>>,
    /// Attached to or detached from the display.
    pub displayed: Observers<PropertyChange<bool>>,
}

/// Event channels of the display.
#[derive(Debug, Default)]
pub struct DisplayEvents {
    /// Top-level children changed.
    pub children: Observers<ChildrenChange>,
    /// Display size changed.
    pub size: Observers<(Size, Size)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use alloc::vec;
    use std::sync::Mutex;

    fn id(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn diff_reports_move_of_every_shifted_sibling() {
        let (a, b, c) = (id(0), id(1), id(2));
        let diff = ChildrenDiff::between(&[a, b, c], &[b, c, a]);
        assert!(diff.removed.is_empty());
        assert!(diff.added.is_empty());
        assert_eq!(diff.moved.len(), 3);
        assert_eq!(diff.moved[&2], (0, a));
        assert_eq!(diff.moved[&0], (1, b));
    }

    #[test]
    fn diff_insert_and_remove() {
        let (a, b, c) = (id(0), id(1), id(2));
        let diff = ChildrenDiff::between(&[a, b], &[a, c]);
        assert_eq!(diff.removed, BTreeMap::from([(1, b)]));
        assert_eq!(diff.added, BTreeMap::from([(1, c)]));
        assert!(diff.moved.is_empty());
        assert!(ChildrenDiff::between(&[a], &[a]).is_empty());
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let seen = Arc::new(Mutex::new(vec![]));
        let mut observers = Observers::<PropertyChange<i32>>::default();
        let s = seen.clone();
        let first = observers.subscribe(move |e| s.lock().unwrap().push(e.new));
        let s = seen.clone();
        observers.subscribe(move |e| s.lock().unwrap().push(e.new * 10));

        observers.notify(&PropertyChange {
            node: id(0),
            old: 0,
            new: 1,
        });
        assert!(observers.unsubscribe(first));
        assert!(!observers.unsubscribe(first));
        observers.notify(&PropertyChange {
            node: id(0),
            old: 1,
            new: 2,
        });
        assert_eq!(*seen.lock().unwrap(), vec![1, 10, 20]);
    }
}

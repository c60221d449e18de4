// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node and container identity types.

use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a node in a [`NodeStore`](super::NodeStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Rebuilds a handle from [`index`](Self::index) and
    /// [`generation`](Self::generation), e.g. when decoding a recorded trace.
    ///
    /// The result is only meaningful for the store that issued it.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// Something that holds an ordered list of children.
///
/// The [`Display`](crate::display::Display) anchors the attached tree; every
/// other container is a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    /// The root display.
    Display,
    /// A node.
    Node(NodeId),
}

impl Container {
    /// Returns the node, if this container is one.
    #[inline]
    #[must_use]
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Display => None,
            Self::Node(id) => Some(id),
        }
    }
}

impl From<NodeId> for Container {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

/// How a parentless node is anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Not anchored; the node is either nested or detached.
    #[default]
    None,
    /// A top-level child of the display.
    Display,
    /// An overlay shown outside sibling ordering.
    Popup,
}

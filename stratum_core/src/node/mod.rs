// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene node data model.
//!
//! A *node* is a positionable, paintable element of the retained tree. Each
//! node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: an optional parent (a plain index, never an owner) and an
//!   ordered children list. The children lists are the only ownership edges.
//! - **Authored properties**: bounds, transform, camera, visibility, opacity,
//!   z-order, clipping, size hints, content direction, and an optional
//!   [`Layout`](crate::layout::Layout).
//! - **Computed properties**: the bounding box (bounds mapped through the
//!   resolved transform), the resolved content direction, and whether the
//!   node needs a mirroring flip relative to its parent.
//!
//! Nodes live in struct-of-arrays storage inside [`NodeStore`], which also
//! owns the [`Display`](crate::display::Display) at the root. Mutation goes
//! through [`Scene`](crate::scene::Scene), which pairs each store change
//! with the matching render-manager bookkeeping.

mod clip;
mod direction;
mod geometry;
mod id;
mod store;
mod topology;
mod traverse;

pub use clip::ClipPath;
pub use id::{Anchor, Container, INVALID, NodeId};
pub use store::NodeStore;
pub use traverse::Ancestors;

/// Reading direction of a node's content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentDirection {
    /// Left to right.
    #[default]
    LeftToRight,
    /// Right to left.
    RightToLeft,
}

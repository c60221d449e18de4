// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use crate::node::NodeId;

/// A rejected scene mutation.
///
/// These are returned before any state changes, so a failed call leaves the
/// scene exactly as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// A node cannot be its own child.
    #[error("cannot add {0:?} to itself")]
    CannotAddToSelf(NodeId),
    /// A node cannot be added below one of its own descendants.
    #[error("cannot add ancestor {ancestor:?} to descendant {descendant:?}")]
    CannotAddAncestor {
        /// The node being inserted.
        ancestor: NodeId,
        /// The container it was inserted into.
        descendant: NodeId,
    },
    /// The handle refers to a destroyed node.
    #[error("stale node handle {0:?}")]
    StaleNode(NodeId),
    /// A child index was past the end of the children list.
    #[error("index {index} out of bounds for {len} children")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of children at the time of the call.
        len: usize,
    },
    /// The node is not in the given container.
    #[error("{0:?} is not a child of the given container")]
    NotAChild(NodeId),
    /// The operation requires a node that is not part of any tree.
    #[error("{0:?} is still part of a tree")]
    NotDetached(NodeId),
    /// The operation requires a node attached to the display.
    #[error("{0:?} is not attached to the display")]
    NotAttached(NodeId),
    /// The operation requires a node that is currently shown as a popup.
    #[error("{0:?} is not a popup")]
    NotAPopup(NodeId),
}

/// A failed backend surface operation.
///
/// The render manager logs these and skips the single write that failed; the
/// rest of the frame still runs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The backend does not support the requested property value.
    #[error("unsupported surface operation: {0}")]
    Unsupported(&'static str),
    /// The backend could not allocate a surface.
    #[error("surface allocation failed: {0}")]
    Allocation(String),
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting behaviors and external collaborators.
//!
//! A [`Behavior`] paints one node into its surface's canvas. The
//! [`AccessibilityManager`] and [`ThemeManager`] are optional host services
//! the scene notifies as nodes come and go; when absent, nothing is notified.

use kurbo::{Rect, Size};

use crate::node::{ContentDirection, NodeId};

/// What a behavior sees of its node while painting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeInfo {
    /// The node being painted.
    pub id: NodeId,
    /// Bounds in the parent's coordinates.
    pub bounds: Rect,
    /// Resolved content direction.
    pub content_direction: ContentDirection,
    /// Whether the node is mirrored.
    pub mirrored: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl NodeInfo {
    /// Size of the node's canvas.
    #[must_use]
    pub fn size(&self) -> Size {
        self.bounds.size()
    }
}

/// Paints one node.
///
/// A node without a behavior paints nothing; its surface still exists and
/// its children still paint.
pub trait Behavior<C: ?Sized>: Send {
    /// Paints the node into `canvas`.
    fn render(&self, info: &NodeInfo, canvas: &mut C);

    /// Called when the behavior is attached to `id`.
    fn install(&mut self, id: NodeId) {
        _ = id;
    }

    /// Called when the behavior is detached from `id`.
    fn uninstall(&mut self, id: NodeId) {
        _ = id;
    }
}

/// Receives attachment notifications for the accessibility tree.
pub trait AccessibilityManager: Send {
    /// `id` was attached to the display.
    fn node_attached(&mut self, id: NodeId);

    /// `id` was detached from the display.
    fn node_detached(&mut self, id: NodeId);
}

/// Re-applies theming to nodes entering the scene.
pub trait ThemeManager: Send {
    /// `id` was recorded for its first paint.
    fn update(&mut self, id: NodeId);
}

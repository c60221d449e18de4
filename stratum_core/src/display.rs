// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root container.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Insets, Point, Rect, Size};

use crate::event::DisplayEvents;
use crate::layout::Layout;
use crate::node::{ContentDirection, NodeId};

/// The root that anchors every attached node.
///
/// Top-level nodes have no parent node; their surfaces have no parent
/// surface. Popups are anchored here too but sit outside the ordered
/// children list.
#[derive(Debug)]
pub struct Display {
    pub(crate) size: Size,
    pub(crate) children: Vec<NodeId>,
    pub(crate) popups: Vec<NodeId>,
    pub(crate) layout: Option<Box<dyn Layout>>,
    pub(crate) insets: Insets,
    pub(crate) content_direction: ContentDirection,
    pub(crate) mirror_when_right_to_left: bool,
    pub(crate) events: DisplayEvents,
}

impl Display {
    pub(crate) fn new(
        size: Size,
        content_direction: ContentDirection,
        mirror_when_right_to_left: bool,
    ) -> Self {
        Self {
            size,
            children: Vec::new(),
            popups: Vec::new(),
            layout: None,
            insets: Insets::ZERO,
            content_direction,
            mirror_when_right_to_left,
            events: DisplayEvents::default(),
        }
    }

    /// Size of the display.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// The display's area in its own coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.size)
    }

    /// Top-level nodes in paint order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Nodes shown as popups, oldest first.
    #[must_use]
    pub fn popups(&self) -> &[NodeId] {
        &self.popups
    }

    /// Insets handed to the display's layout.
    #[must_use]
    pub fn insets(&self) -> Insets {
        self.insets
    }

    /// Content direction inherited by nodes without an override.
    #[must_use]
    pub fn content_direction(&self) -> ContentDirection {
        self.content_direction
    }

    /// Whether the display mirrors its contents when right-to-left.
    #[must_use]
    pub fn mirror_when_right_to_left(&self) -> bool {
        self.mirror_when_right_to_left
    }

    /// Whether the display itself is mirrored.
    #[must_use]
    pub fn mirrored(&self) -> bool {
        self.content_direction == ContentDirection::RightToLeft && self.mirror_when_right_to_left
    }

    /// Position of `id` among the top-level children, or `None`.
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.children.iter().position(|c| *c == id)
    }

    /// Whether `id` is a top-level child.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.children.contains(&id)
    }

    /// Whether `id` is shown as a popup.
    #[must_use]
    pub fn is_popup(&self, id: NodeId) -> bool {
        self.popups.contains(&id)
    }

    /// The display's event channels.
    pub fn events_mut(&mut self) -> &mut DisplayEvents {
        &mut self.events
    }
}

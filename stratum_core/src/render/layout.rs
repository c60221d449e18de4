// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying a container's layout.

use kurbo::{Rect, Size};

use crate::device::SurfaceFactory;
use crate::layout::clamp_size;
use crate::node::Container;
use crate::scene::Scene;

use super::changes::is_empty;

impl<F: SurfaceFactory> Scene<F> {
    /// Runs the layout of `container` now and applies the resulting bounds.
    ///
    /// Child bounds are written through the normal mutation path, so a
    /// resized child with its own layout is queued (or, for the container
    /// itself, laid out again in place).
    ///
    /// # Panics
    ///
    /// Panics if layouts nest deeper than `max_layout_passes`, which means a
    /// layout keeps resizing its own container.
    pub(crate) fn perform_layout(&mut self, container: Container) {
        self.manager.pending_layout.remove(&container);

        let (min, current, max, insets) = match container {
            Container::Display => {
                let size = self.store.display.size;
                (size, size, size, self.store.display.insets)
            }
            Container::Node(id) => {
                if !self.store.is_alive(id) {
                    return;
                }
                (
                    self.store.minimum_size(id),
                    self.store.size(id),
                    Size::new(f64::INFINITY, f64::INFINITY),
                    self.store.insets(id),
                )
            }
        };

        let mut children = self.store.layout_children(container);
        let layout = match container {
            Container::Display => self.store.display.layout.as_deref(),
            Container::Node(id) => self.store.layout[id.idx as usize].as_deref(),
        };
        let Some(layout) = layout else {
            return;
        };
        let size = clamp_size(
            layout.layout(&mut children, min, current, max, insets),
            min,
            max,
        );

        self.manager.layout_depth += 1;
        assert!(
            self.manager.layout_depth <= self.config.max_layout_passes,
            "layout of {container:?} did not settle after {} nested passes",
            self.config.max_layout_passes,
        );
        log::trace!("laying out {container:?}");
        let previous = self.manager.laying_out.replace(container);

        for child in &children {
            let id = child.id();
            if self.store.is_alive(id) && self.store.bounds(id) != child.bounds() {
                self.apply_bounds(id, child.bounds());
            }
        }
        if let Container::Node(id) = container
            && size != current
        {
            let origin = self.store.position(id);
            self.apply_bounds(id, Rect::from_origin_size(origin, size));
        }

        self.manager.laying_out = previous;
        self.manager.layout_depth -= 1;
    }

    /// Lays out `container` immediately if it is eligible.
    ///
    /// Eligible means a registered, displayed, non-empty node with children
    /// that is not laying out already. Returns whether it ran.
    pub(crate) fn layout_if_ready(&mut self, container: Container) -> bool {
        if self.manager.laying_out == Some(container) {
            return false;
        }
        if let Container::Node(id) = container
            && (self.store.children(id).is_empty()
                || !self.manager.views.contains(&id)
                || is_empty(self.store.bounds(id))
                || !self.store.displayed(id))
        {
            return false;
        }
        self.perform_layout(container);
        true
    }
}

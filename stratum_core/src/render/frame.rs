// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame flush.
//!
//! ```text
//! on_frame
//!   ├─ drain cross-thread jobs
//!   └─ loop while work is pending
//!        ├─ Layout   pending containers, shallowest first, until none remain
//!        ├─ Cleanup  release removed subtrees and their surfaces
//!        ├─ Attach   create surfaces, push initial state of new nodes
//!        ├─ Sync     push changed bounds, visibility and property deltas
//!        └─ Paint    hand canvases to behaviors
//! ```
//!
//! Every phase only consumes work; none of them produces work for an earlier
//! phase except layout, which settles internally. One pass normally suffices.

use alloc::vec::Vec;

use hashbrown::HashMap;
use understory_dirty::Channel;

use crate::behavior::NodeInfo;
use crate::device::{CanvasOf, SurfaceFactory, SurfaceValue};
use crate::dirty;
use crate::node::{Container, NodeId};
use crate::scene::Scene;
use crate::scheduler::JobKind;
use crate::trace::{FrameBeginEvent, FrameSummary, FrameTrace, PhaseKind, SurfaceAction, Tracer};

use super::changes::is_empty;

/// Local channels in push order.
const PROPERTY_CHANNELS: [Channel; 5] = [
    dirty::TRANSFORM,
    dirty::OPACITY,
    dirty::Z_ORDER,
    dirty::INDEX,
    dirty::CLIP,
];

impl<F: SurfaceFactory> Scene<F> {
    /// Flushes all pending work to the backend.
    ///
    /// Call this from the host's frame callback. Calling it with nothing
    /// pending issues no backend calls.
    ///
    /// # Panics
    ///
    /// Panics if a layout does not settle within
    /// [`max_layout_passes`](crate::config::RenderConfig::max_layout_passes).
    pub fn on_frame(&mut self) -> FrameSummary {
        self.on_frame_traced(Tracer::none())
    }

    /// Like [`on_frame`](Self::on_frame), reporting to `tracer`.
    pub fn on_frame_traced(&mut self, mut tracer: Tracer<'_>) -> FrameSummary {
        self.invalidator.begin_frame();
        let frame_index = self.manager.frame_index;
        self.manager.frame_index += 1;
        self.manager.painting = true;

        let jobs = self.invalidator.drain();
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            jobs: jobs.len(),
        });
        let mut trace = FrameTrace::new(tracer, frame_index);
        for job in jobs {
            if !self.store.is_alive(job.node) {
                continue;
            }
            match job.kind {
                JobKind::Render => {
                    self.render_node(job.node, false);
                }
                JobKind::Relayout => self.schedule_layout(Container::Node(job.node)),
            }
        }

        let mut deferred = Vec::new();
        while self.manager.has_pending_work() {
            trace.summary.pass();
            self.layout_phase(&mut trace);
            self.cleanup_phase(&mut trace);
            self.attach_phase(&mut trace, &mut deferred);
            self.sync_phase(&mut trace);
            self.paint_phase(&mut trace);
        }
        self.manager.painting = false;
        if !deferred.is_empty() {
            self.manager.pending_render.extend(deferred);
            self.schedule_paint();
        }

        let summary = trace.finish();
        log::debug!(
            "frame {frame_index}: {} passes, {} layouts, {} writes, {} paints",
            summary.passes,
            summary.layouts,
            summary.writes,
            summary.paints
        );
        summary
    }

    fn next_pending_layout(&self) -> Option<Container> {
        self.manager
            .pending_layout
            .iter()
            .copied()
            .min_by_key(|c| match c {
                Container::Display => (0, 0),
                Container::Node(id) if self.store.is_alive(*id) => {
                    (self.store.depth(*id) + 1, id.idx)
                }
                Container::Node(id) => (0, id.idx),
            })
    }

    fn layout_phase(&mut self, trace: &mut FrameTrace<'_>) {
        trace.phase_begin(PhaseKind::Layout);
        let max = self.config.max_layout_passes;
        let mut runs: HashMap<Container, u32> = HashMap::new();
        let mut count = 0;
        while let Some(next) = self.next_pending_layout() {
            let n = runs.entry(next).or_default();
            *n += 1;
            assert!(
                *n <= max,
                "layout of {next:?} did not settle within {max} passes"
            );
            if let Container::Node(id) = next
                && !(self.store.is_alive(id) && self.store.is_attached(id))
            {
                self.manager.pending_layout.remove(&next);
                continue;
            }
            self.perform_layout(next);
            trace.summary.layout();
            count += 1;
        }
        trace.phase_end(PhaseKind::Layout, count);
    }

    fn cleanup_phase(&mut self, trace: &mut FrameTrace<'_>) {
        trace.phase_begin(PhaseKind::Cleanup);
        let mut entries: Vec<(Container, Vec<NodeId>)> =
            self.manager.pending_cleanup.drain().collect();
        entries.sort_by_key(|(c, _)| match c {
            Container::Display => (0, 0),
            Container::Node(id) => (1, id.idx),
        });
        for (container, list) in entries {
            for child in list {
                self.release_resources(container, child);
            }
        }

        let mut count = 0;
        for id in core::mem::take(&mut self.manager.pending_release) {
            for node in self.device.release(id) {
                trace.surface(node, SurfaceAction::Released);
                count += 1;
                // Still registered under a new parent; it gets a new surface.
                if self.manager.views.contains(&node) {
                    self.manager.mark_unrendered(node);
                }
            }
        }
        trace.phase_end(PhaseKind::Cleanup, count);
    }

    fn attach_phase(&mut self, trace: &mut FrameTrace<'_>, deferred: &mut Vec<NodeId>) {
        trace.phase_begin(PhaseKind::Attach);
        let mut queue: Vec<NodeId> = self
            .manager
            .pending_render
            .drain()
            .filter(|id| {
                self.store.is_alive(*id)
                    && self.manager.views.contains(id)
                    && self.store.is_attached(*id)
            })
            .collect();
        queue.sort_by_key(|id| (self.store.depth(*id), id.idx));

        let mut count = 0;
        for id in queue {
            let visible = self.store.recursively_visible(id);
            if !visible
                && !(self.manager.visibility_changed.contains(&id) && self.device.has_surface(id))
            {
                continue;
            }
            if !self.device.surface_for(&self.store, id, trace) {
                deferred.push(id);
                continue;
            }
            if visible
                && self.manager.never_rendered.contains(&id)
                && !is_empty(self.store.bounds(id))
            {
                self.push_initial_state(id, trace);
                self.manager.never_rendered.remove(&id);
                if self.manager.pending_bounds.remove(&id) {
                    self.check_display_rect(id);
                }
                self.manager.visibility_changed.remove(&id);
                count += 1;
            }
        }
        trace.phase_end(PhaseKind::Attach, count);
    }

    fn push_initial_state(&mut self, id: NodeId, trace: &mut FrameTrace<'_>) {
        self.push(id, SurfaceValue::Bounds(self.store.bounds(id)), trace);
        self.push(
            id,
            SurfaceValue::Transform(self.store.projected_transform(id)),
            trace,
        );
        self.push(id, SurfaceValue::Opacity(self.store.opacity(id)), trace);
        self.push(id, SurfaceValue::Index(self.surface_index(id)), trace);
        if !self.store.is_popup(id) {
            self.push(id, SurfaceValue::ZOrder(self.store.z_order(id)), trace);
        }
        self.push(id, SurfaceValue::Visible(self.store.visible(id)), trace);
        self.push_clip(id, trace);
    }

    fn push_clip(&mut self, id: NodeId, trace: &mut FrameTrace<'_>) {
        self.push(
            id,
            SurfaceValue::ClipCanvasToBounds(self.store.clip_canvas_to_bounds(id)),
            trace,
        );
        self.push(
            id,
            SurfaceValue::ChildrenClip(self.store.children_clip(id).cloned()),
            trace,
        );
    }

    fn push(&mut self, id: NodeId, value: SurfaceValue, trace: &mut FrameTrace<'_>) {
        let property = value.property();
        let outcome = self.device.push(id, value);
        trace.pushed(id, property, &outcome);
    }

    /// Position among siblings as the backend sees it; `-1` for popups.
    fn surface_index(&self, id: NodeId) -> i32 {
        if self.store.is_popup(id) {
            return -1;
        }
        let siblings = match self.store.parent(id) {
            Some(p) => self.store.children(p),
            None => self.store.display.children(),
        };
        siblings
            .iter()
            .position(|c| *c == id)
            .map_or(-1, |i| i32::try_from(i).unwrap_or(i32::MAX))
    }

    fn sync_phase(&mut self, trace: &mut FrameTrace<'_>) {
        trace.phase_begin(PhaseKind::Sync);
        let mut count = 0;

        let mut moved: Vec<NodeId> = self
            .manager
            .pending_bounds
            .drain()
            .filter(|id| self.store.is_alive(*id))
            .collect();
        moved.sort_by_key(|id| (self.store.depth(*id), id.idx));
        for id in moved {
            if self.device.has_surface(id) && !self.manager.never_rendered.contains(&id) {
                self.push(id, SurfaceValue::Bounds(self.store.bounds(id)), trace);
                count += 1;
            }
            self.check_display_rect(id);
        }

        let flipped: Vec<NodeId> = self.manager.visibility_changed.drain().collect();
        for id in flipped {
            if self.store.is_alive(id) && self.device.has_surface(id) {
                self.push(id, SurfaceValue::Visible(self.store.visible(id)), trace);
                count += 1;
            }
        }

        if core::mem::take(&mut self.manager.properties_dirty) {
            for channel in PROPERTY_CHANNELS {
                let marked: Vec<u32> = self
                    .manager
                    .tracker
                    .drain(channel)
                    .deterministic()
                    .run()
                    .collect();
                for idx in marked {
                    if idx >= self.store.len || !self.store.alive[idx as usize] {
                        continue;
                    }
                    let id = self.store.id_at(idx);
                    if !self.device.has_surface(id) {
                        continue;
                    }
                    self.push_property(id, channel, trace);
                    count += 1;
                }
            }
        }
        trace.phase_end(PhaseKind::Sync, count);
    }

    fn push_property(&mut self, id: NodeId, channel: Channel, trace: &mut FrameTrace<'_>) {
        let value = if channel == dirty::TRANSFORM {
            SurfaceValue::Transform(self.store.projected_transform(id))
        } else if channel == dirty::OPACITY {
            SurfaceValue::Opacity(self.store.opacity(id))
        } else if channel == dirty::Z_ORDER && !self.store.is_popup(id) {
            SurfaceValue::ZOrder(self.store.z_order(id))
        } else if channel == dirty::INDEX {
            SurfaceValue::Index(self.surface_index(id))
        } else if channel == dirty::CLIP {
            self.push_clip(id, trace);
            return;
        } else {
            return;
        };
        self.push(id, value, trace);
    }

    fn paint_phase(&mut self, trace: &mut FrameTrace<'_>) {
        trace.phase_begin(PhaseKind::Paint);
        let mut targets: Vec<NodeId> = self
            .manager
            .dirty
            .iter()
            .copied()
            .filter(|id| {
                self.store.is_alive(*id)
                    && self.manager.views.contains(id)
                    && !self.manager.never_rendered.contains(id)
                    && self.store.is_attached(*id)
                    && self.store.recursively_visible(*id)
                    && !is_empty(self.store.bounds(*id))
                    && self.device.has_surface(*id)
            })
            .collect();
        targets.sort_by_key(|id| (self.store.depth(*id), id.idx));

        let count = targets.len();
        for id in targets {
            self.manager.dirty.remove(&id);
            let info = NodeInfo {
                id,
                bounds: self.store.bounds(id),
                content_direction: self.store.content_direction(id),
                mirrored: self.store.mirrored(id),
                opacity: self.store.opacity(id),
            };
            let behavior = self.behaviors.get(&id);
            let result = self.device.render(id, &mut |canvas: &mut CanvasOf<F>| {
                if let Some(behavior) = behavior {
                    behavior.render(&info, canvas);
                }
            });
            if let Err(err) = &result {
                log::warn!("painting {id:?} failed: {err}");
            }
            trace.paint(id, result.is_ok());
        }
        trace.phase_end(PhaseKind::Paint, count);
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame flush.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! render manager calls at each stage of a frame. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Events carry no timestamps; sinks that care about durations stamp events
//! on arrival with whatever clock the host has.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`PropertyWriteEvent`] and the
//!   matching `TraceSink` method.

use crate::device::{PushOutcome, SurfaceProperty};
use crate::node::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame flush is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Pending layouts, ancestor first.
    Layout,
    /// Releasing subtrees removed this frame.
    Cleanup,
    /// Creating surfaces for newly eligible nodes.
    Attach,
    /// Pushing property deltas to surfaces.
    Sync,
    /// Rendering dirty nodes.
    Paint,
}

impl PhaseKind {
    /// All phases in flush order.
    pub const ALL: [Self; 5] = [
        Self::Layout,
        Self::Cleanup,
        Self::Attach,
        Self::Sync,
        Self::Paint,
    ];

    /// A short lowercase label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Cleanup => "cleanup",
            Self::Attach => "attach",
            Self::Sync => "sync",
            Self::Paint => "paint",
        }
    }
}

/// What happened to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceAction {
    /// The factory created a surface for the node.
    Created,
    /// The node's surface was released.
    Released,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once when a flush starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Cross-thread jobs applied before the first phase.
    pub jobs: usize,
}

/// Marks the beginning of a flush phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Which iteration of the settle loop this phase belongs to.
    pub pass: u32,
}

/// Marks the end of a flush phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Which iteration of the settle loop this phase belongs to.
    pub pass: u32,
    /// Nodes the phase touched.
    pub count: usize,
}

/// Emitted when a surface is created or released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The node owning the surface.
    pub node: NodeId,
    /// Created or released.
    pub action: SurfaceAction,
}

/// Emitted after a node's surface was asked to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaintEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The painted node.
    pub node: NodeId,
    /// Whether the backend reported success.
    pub ok: bool,
}

/// A single surface property write (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyWriteEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The node owning the surface.
    pub node: NodeId,
    /// Which property was written.
    pub property: SurfaceProperty,
    /// Whether the backend accepted the write.
    pub ok: bool,
}

/// Per-frame counts produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Iterations of the settle loop.
    pub passes: u32,
    /// Layouts applied.
    pub layouts: usize,
    /// Surfaces created.
    pub surfaces_created: usize,
    /// Surfaces released.
    pub surfaces_released: usize,
    /// Property writes accepted by the backend.
    pub writes: usize,
    /// Property writes the backend rejected.
    pub failed_writes: usize,
    /// Nodes painted.
    pub paints: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame flush.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a flush starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a flush phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a flush phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a surface is created or released.
    fn on_surface(&mut self, e: &SurfaceEvent) {
        _ = e;
    }

    /// Called after each node paint.
    fn on_paint(&mut self, e: &PaintEvent) {
        _ = e;
    }

    /// Called for every surface property write (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_property_write(&mut self, e: &PropertyWriteEvent) {
        _ = e;
    }

    /// Called once with the frame's counts.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceEvent`].
    #[inline]
    pub fn surface(&mut self, e: &SurfaceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintEvent`].
    #[inline]
    pub fn paint(&mut self, e: &PaintEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_paint(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PropertyWriteEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn property_write(&mut self, e: &PropertyWriteEvent) {
        if let Some(s) = &mut self.sink {
            s.on_property_write(e);
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Counts what a flush did and produces a [`FrameSummary`].
///
/// The render manager keeps one of these per flush regardless of whether a
/// sink is attached; the counts are cheap.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSummaryBuilder {
    summary: FrameSummary,
}

impl FrameSummaryBuilder {
    /// Starts counting for the given frame.
    #[must_use]
    pub fn new(frame_index: u64) -> Self {
        Self {
            summary: FrameSummary {
                frame_index,
                ..FrameSummary::default()
            },
        }
    }

    /// Records the start of another settle-loop iteration.
    pub fn pass(&mut self) {
        self.summary.passes += 1;
    }

    /// Records an applied layout.
    pub fn layout(&mut self) {
        self.summary.layouts += 1;
    }

    /// Records a surface lifecycle event.
    pub fn surface(&mut self, action: SurfaceAction) {
        match action {
            SurfaceAction::Created => self.summary.surfaces_created += 1,
            SurfaceAction::Released => self.summary.surfaces_released += 1,
        }
    }

    /// Records a property write.
    pub fn write(&mut self, ok: bool) {
        if ok {
            self.summary.writes += 1;
        } else {
            self.summary.failed_writes += 1;
        }
    }

    /// Records a paint.
    pub fn paint(&mut self) {
        self.summary.paints += 1;
    }

    /// Returns the counts so far.
    #[must_use]
    pub fn peek(&self) -> &FrameSummary {
        &self.summary
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        self.summary
    }
}

// ---------------------------------------------------------------------------
// FrameTrace
// ---------------------------------------------------------------------------

/// A tracer paired with the running counts of one flush.
#[derive(Debug)]
pub(crate) struct FrameTrace<'a> {
    pub(crate) tracer: Tracer<'a>,
    pub(crate) summary: FrameSummaryBuilder,
    pub(crate) frame_index: u64,
}

impl<'a> FrameTrace<'a> {
    pub(crate) fn new(tracer: Tracer<'a>, frame_index: u64) -> Self {
        Self {
            tracer,
            summary: FrameSummaryBuilder::new(frame_index),
            frame_index,
        }
    }

    #[cfg(test)]
    pub(crate) fn none() -> Self {
        Self::new(Tracer::none(), 0)
    }

    pub(crate) fn phase_begin(&mut self, phase: PhaseKind) {
        self.tracer.phase_begin(&PhaseBeginEvent {
            frame_index: self.frame_index,
            phase,
            pass: self.summary.peek().passes,
        });
    }

    pub(crate) fn phase_end(&mut self, phase: PhaseKind, count: usize) {
        self.tracer.phase_end(&PhaseEndEvent {
            frame_index: self.frame_index,
            phase,
            pass: self.summary.peek().passes,
            count,
        });
    }

    pub(crate) fn surface(&mut self, node: NodeId, action: SurfaceAction) {
        self.summary.surface(action);
        self.tracer.surface(&SurfaceEvent {
            frame_index: self.frame_index,
            node,
            action,
        });
    }

    pub(crate) fn paint(&mut self, node: NodeId, ok: bool) {
        self.summary.paint();
        self.tracer.paint(&PaintEvent {
            frame_index: self.frame_index,
            node,
            ok,
        });
    }

    #[cfg_attr(
        not(feature = "trace-rich"),
        expect(unused_variables, reason = "only traced with trace-rich")
    )]
    pub(crate) fn write(&mut self, node: NodeId, property: SurfaceProperty, ok: bool) {
        self.summary.write(ok);
        #[cfg(feature = "trace-rich")]
        self.tracer.property_write(&PropertyWriteEvent {
            frame_index: self.frame_index,
            node,
            property,
            ok,
        });
    }

    /// Counts and traces one device push; skipped pushes are not writes.
    pub(crate) fn pushed(
        &mut self,
        node: NodeId,
        property: SurfaceProperty,
        outcome: &PushOutcome,
    ) {
        match outcome {
            PushOutcome::Written => self.write(node, property, true),
            PushOutcome::Failed(_) => self.write(node, property, false),
            PushOutcome::Skipped | PushOutcome::NoSurface => {}
        }
    }

    pub(crate) fn finish(mut self) -> FrameSummary {
        let summary = self.summary.finish();
        self.tracer.frame_summary(&summary);
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            jobs: 0,
        });
        sink.on_frame_summary(&FrameSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&FrameBeginEvent {
            frame_index: 1,
            jobs: 2,
        });
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: PhaseKind::Layout,
            pass: 0,
        });
    }

    #[test]
    fn summary_builder_counts() {
        let mut builder = FrameSummaryBuilder::new(9);
        builder.pass();
        builder.layout();
        builder.surface(SurfaceAction::Created);
        builder.surface(SurfaceAction::Created);
        builder.surface(SurfaceAction::Released);
        builder.write(true);
        builder.write(false);
        builder.paint();
        let s = builder.finish();
        assert_eq!(s.frame_index, 9);
        assert_eq!(s.passes, 1);
        assert_eq!(s.layouts, 1);
        assert_eq!(s.surfaces_created, 2);
        assert_eq!(s.surfaces_released, 1);
        assert_eq!((s.writes, s.failed_writes), (1, 1));
        assert_eq!(s.paints, 1);
    }

    #[test]
    fn phase_names_are_distinct() {
        let names: alloc::vec::Vec<_> = PhaseKind::ALL.iter().map(|p| p.name()).collect();
        for (i, a) in names.iter().enumerate() {
            assert!(!names[i + 1..].contains(a));
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame_begin(&FrameBeginEvent {
            frame_index: 42,
            jobs: 0,
        });
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
    }
}

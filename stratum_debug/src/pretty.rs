// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Phases are
//! indented under their frame so a flush reads top to bottom.

use std::io::Write;

use stratum_core::node::NodeId;
use stratum_core::trace::{
    FrameBeginEvent, FrameSummary, PaintEvent, PhaseBeginEvent, PhaseEndEvent,
    PropertyWriteEvent, SurfaceAction, SurfaceEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    writes: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            writes: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            writes: false,
        }
    }

    /// Also prints one line per surface property write.
    ///
    /// Off by default; a first frame writes every property of every surface.
    #[must_use]
    pub fn with_property_writes(mut self, enabled: bool) -> Self {
        self.writes = enabled;
        self
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn node(id: NodeId) -> String {
    format!("#{}.{}", id.index(), id.generation())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] {} jobs={}",
            e.frame_index, e.jobs
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "  [{}:begin] frame={} pass={}",
            e.phase.name(),
            e.frame_index,
            e.pass,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "  [{}:end] frame={} pass={} count={}",
            e.phase.name(),
            e.frame_index,
            e.pass,
            e.count,
        );
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        let action = match e.action {
            SurfaceAction::Created => "created",
            SurfaceAction::Released => "released",
        };
        let _ = writeln!(self.writer, "    [surface] {} {action}", node(e.node));
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        let status = if e.ok { "ok" } else { "FAILED" };
        let _ = writeln!(self.writer, "    [paint] {} {status}", node(e.node));
    }

    fn on_property_write(&mut self, e: &PropertyWriteEvent) {
        if !self.writes && e.ok {
            return;
        }
        let status = if e.ok { "ok" } else { "FAILED" };
        let _ = writeln!(
            self.writer,
            "    [write] {} {:?} {status}",
            node(e.node),
            e.property,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} passes={} layouts={} created={} released={} \
             writes={} failed={} paints={}",
            s.frame_index,
            s.passes,
            s.layouts,
            s.surfaces_created,
            s.surfaces_released,
            s.writes,
            s.failed_writes,
            s.paints,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::device::SurfaceProperty;
    use stratum_core::trace::PhaseKind;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_phases() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 3,
            jobs: 1,
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 3,
            phase: PhaseKind::Attach,
            pass: 1,
            count: 4,
        });
        let out = output(sink);
        assert!(out.contains("[frame] 3 jobs=1"), "got: {out}");
        assert!(out.contains("[attach:end] frame=3 pass=1 count=4"), "got: {out}");
    }

    #[test]
    fn successful_writes_are_quiet_by_default() {
        let write = |ok| PropertyWriteEvent {
            frame_index: 0,
            node: NodeId::from_raw(2, 0),
            property: SurfaceProperty::Opacity,
            ok,
        };
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_property_write(&write(true));
        sink.on_property_write(&write(false));
        let out = output(sink);
        assert_eq!(out.lines().count(), 1, "got: {out}");
        assert!(out.contains("#2.0 Opacity FAILED"), "got: {out}");

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_property_writes(true);
        sink.on_property_write(&write(true));
        assert!(output(sink).contains("Opacity ok"));
    }
}

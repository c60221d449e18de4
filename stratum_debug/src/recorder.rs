// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. Flush events carry no
//! clock, so every record is stamped on arrival with the nanoseconds elapsed
//! since the recorder was created. [`decode`] reads them back as an iterator
//! of [`Recorded`] events.

use std::time::Instant;

use stratum_core::device::SurfaceProperty;
use stratum_core::node::NodeId;
use stratum_core::trace::{
    FrameBeginEvent, FrameSummary, PaintEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    PropertyWriteEvent, SurfaceAction, SurfaceEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_SURFACE: u8 = 4;
const TAG_PAINT: u8 = 5;
const TAG_PROPERTY_WRITE: u8 = 6;
const TAG_FRAME_SUMMARY: u8 = 7;

const PROPERTIES: [SurfaceProperty; 8] = [
    SurfaceProperty::Bounds,
    SurfaceProperty::Transform,
    SurfaceProperty::Index,
    SurfaceProperty::ZOrder,
    SurfaceProperty::Opacity,
    SurfaceProperty::Visible,
    SurfaceProperty::ClipCanvasToBounds,
    SurfaceProperty::ChildrenClip,
];

fn count(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    start: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            start: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let elapsed = u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.write_u8(tag);
        self.write_u64(elapsed);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_node(&mut self, id: NodeId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Layout => 0,
            PhaseKind::Cleanup => 1,
            PhaseKind::Attach => 2,
            PhaseKind::Sync => 3,
            PhaseKind::Paint => 4,
        });
    }

    fn write_property(&mut self, p: SurfaceProperty) {
        let tag = PROPERTIES.iter().position(|q| *q == p).unwrap_or(0);
        self.write_u8(u8::try_from(tag).unwrap_or(0));
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.begin(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(count(e.jobs));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.begin(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u32(e.pass);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.begin(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u32(e.pass);
        self.write_u64(count(e.count));
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        self.begin(TAG_SURFACE);
        self.write_u64(e.frame_index);
        self.write_node(e.node);
        self.write_bool(e.action == SurfaceAction::Released);
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        self.begin(TAG_PAINT);
        self.write_u64(e.frame_index);
        self.write_node(e.node);
        self.write_bool(e.ok);
    }

    fn on_property_write(&mut self, e: &PropertyWriteEvent) {
        self.begin(TAG_PROPERTY_WRITE);
        self.write_u64(e.frame_index);
        self.write_node(e.node);
        self.write_property(e.property);
        self.write_bool(e.ok);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.begin(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.passes);
        self.write_u64(count(s.layouts));
        self.write_u64(count(s.surfaces_created));
        self.write_u64(count(s.surfaces_released));
        self.write_u64(count(s.writes));
        self.write_u64(count(s.failed_writes));
        self.write_u64(count(s.paints));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`SurfaceEvent`].
    Surface(SurfaceEvent),
    /// A [`PaintEvent`].
    Paint(PaintEvent),
    /// A [`PropertyWriteEvent`].
    PropertyWrite(PropertyWriteEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

/// A decoded event with its arrival time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recorded {
    /// Nanoseconds between the recorder's creation and the event.
    pub at_nanos: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Recorded`] events.
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_count(&mut self) -> Option<usize> {
        self.read_u64()
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_node(&mut self) -> Option<NodeId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(NodeId::from_raw(index, generation))
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        PhaseKind::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_property(&mut self) -> Option<SurfaceProperty> {
        PROPERTIES.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_event(&mut self, tag: u8) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_FRAME_BEGIN => RecordedEvent::FrameBegin(FrameBeginEvent {
                frame_index: self.read_u64()?,
                jobs: self.read_count()?,
            }),
            TAG_PHASE_BEGIN => RecordedEvent::PhaseBegin(PhaseBeginEvent {
                frame_index: self.read_u64()?,
                phase: self.read_phase()?,
                pass: self.read_u32()?,
            }),
            TAG_PHASE_END => RecordedEvent::PhaseEnd(PhaseEndEvent {
                frame_index: self.read_u64()?,
                phase: self.read_phase()?,
                pass: self.read_u32()?,
                count: self.read_count()?,
            }),
            TAG_SURFACE => RecordedEvent::Surface(SurfaceEvent {
                frame_index: self.read_u64()?,
                node: self.read_node()?,
                action: if self.read_bool()? {
                    SurfaceAction::Released
                } else {
                    SurfaceAction::Created
                },
            }),
            TAG_PAINT => RecordedEvent::Paint(PaintEvent {
                frame_index: self.read_u64()?,
                node: self.read_node()?,
                ok: self.read_bool()?,
            }),
            TAG_PROPERTY_WRITE => RecordedEvent::PropertyWrite(PropertyWriteEvent {
                frame_index: self.read_u64()?,
                node: self.read_node()?,
                property: self.read_property()?,
                ok: self.read_bool()?,
            }),
            TAG_FRAME_SUMMARY => RecordedEvent::FrameSummary(FrameSummary {
                frame_index: self.read_u64()?,
                passes: self.read_u32()?,
                layouts: self.read_count()?,
                surfaces_created: self.read_count()?,
                surfaces_released: self.read_count()?,
                writes: self.read_count()?,
                failed_writes: self.read_count()?,
                paints: self.read_count()?,
            }),
            _ => return None,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Recorded;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at_nanos = self.read_u64()?;
        let event = self.decode_event(tag)?;
        Some(Recorded { at_nanos, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

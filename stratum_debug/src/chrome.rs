// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use stratum_core::node::NodeId;
use stratum_core::trace::SurfaceAction;

use crate::recorder::{Recorded, RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Phases become duration slices; everything else is an instant event.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_json).collect();
    serde_json::to_writer_pretty(writer, &events).map_err(io::Error::other)
}

fn to_json(recorded: Recorded) -> Value {
    let ts = nanos_to_us(recorded.at_nanos);
    match recorded.event {
        RecordedEvent::FrameBegin(e) => instant(
            "FrameBegin",
            "Frame",
            ts,
            json!({ "frame_index": e.frame_index, "jobs": e.jobs }),
        ),
        RecordedEvent::PhaseBegin(e) => json!({
            "ph": "B",
            "name": e.phase.name(),
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": { "frame_index": e.frame_index, "pass": e.pass },
        }),
        RecordedEvent::PhaseEnd(e) => json!({
            "ph": "E",
            "name": e.phase.name(),
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": { "frame_index": e.frame_index, "pass": e.pass, "count": e.count },
        }),
        RecordedEvent::Surface(e) => {
            let name = match e.action {
                SurfaceAction::Created => "SurfaceCreated",
                SurfaceAction::Released => "SurfaceReleased",
            };
            instant(
                name,
                "Surface",
                ts,
                json!({ "frame_index": e.frame_index, "node": node(e.node) }),
            )
        }
        RecordedEvent::Paint(e) => instant(
            "Paint",
            "Surface",
            ts,
            json!({ "frame_index": e.frame_index, "node": node(e.node), "ok": e.ok }),
        ),
        RecordedEvent::PropertyWrite(e) => instant(
            "PropertyWrite",
            "Surface",
            ts,
            json!({
                "frame_index": e.frame_index,
                "node": node(e.node),
                "property": format!("{:?}", e.property),
                "ok": e.ok,
            }),
        ),
        RecordedEvent::FrameSummary(s) => instant(
            "FrameSummary",
            "Frame",
            ts,
            json!({
                "frame_index": s.frame_index,
                "passes": s.passes,
                "layouts": s.layouts,
                "surfaces_created": s.surfaces_created,
                "surfaces_released": s.surfaces_released,
                "writes": s.writes,
                "failed_writes": s.failed_writes,
                "paints": s.paints,
            }),
        ),
    }
}

fn instant(name: &str, cat: &str, ts: f64, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "s": "t",
        "args": args,
    })
}

fn node(id: NodeId) -> String {
    format!("{}.{}", id.index(), id.generation())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

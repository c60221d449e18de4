// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for stratum frame
//! flushes.
//!
//! This crate provides [`TraceSink`](stratum_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`recorder::RecorderSink`]: compact binary recording, stamped on arrival,
//!   with [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Pass any of them to
//! [`Scene::on_frame_traced`](stratum_core::scene::Scene::on_frame_traced)
//! through a [`Tracer`](stratum_core::trace::Tracer).

pub mod chrome;
pub mod pretty;
pub mod recorder;

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained 2D scene graph with batched layout and paint.
//!
//! `stratum_core` keeps a tree of rectangular nodes hanging from a root
//! display, turns property and structure mutations into a minimal set of
//! backend operations, and flushes them once per frame. Nodes live in
//! struct-of-arrays storage addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Scene setters ──► NodeStore (state + events)
//!         │
//!         ▼
//!   render manager sets ──► AnimationScheduler::on_next_frame()
//!                                        │
//!                 ┌──────────────────────┘
//!                 ▼
//!   Scene::on_frame()
//!     Layout ─► Cleanup ─► Attach ─► Sync ─► Paint
//!                              │        │       │
//!                              ▼        ▼       ▼
//!                   GraphicsDevice ──► GraphicsSurface (backend)
//! ```
//!
//! **[`node`]**: Struct-of-arrays node tree with generational handles,
//! geometry, hit testing, and content-direction resolution.
//!
//! **[`scene`]**: The mutation API. Every setter updates the store and files
//! the change with the render manager; nothing reaches the backend until
//! [`Scene::on_frame`](scene::Scene::on_frame).
//!
//! **[`layout`]**: The [`Layout`](layout::Layout) trait and a few stock
//! layouts.
//!
//! **[`device`]**: The backend contract ([`GraphicsSurface`](device::GraphicsSurface),
//! [`SurfaceFactory`](device::SurfaceFactory)) and the per-node surface cache
//! that skips redundant writes.
//!
//! **[`dirty`]**: Dirty-tracking channels via `understory_dirty`.
//!
//! **[`scheduler`]**: Frame requests and the cross-thread
//! [`Invalidator`](scheduler::Invalidator).
//!
//! **[`transform`]** and **[`camera`]**: 3D transforms and perspective.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! flush instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-property
//!   write events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod behavior;
pub mod camera;
pub mod config;
pub mod device;
pub mod dirty;
pub mod display;
pub mod error;
pub mod event;
pub mod layout;
pub mod node;
mod render;
pub mod scene;
pub mod scheduler;
pub mod trace;
pub mod transform;

#[cfg(test)]
mod test_support;

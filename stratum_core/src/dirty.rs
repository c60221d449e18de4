// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Per-property surface deltas and mirror propagation are tracked with
//! [`understory_dirty`]. Each channel is an independent category of change
//! keyed by node slot index.
//!
//! # Propagation semantics
//!
//! - **Propagating** — [`MIRROR`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) with dependency edges from
//!   child to parent. Content direction is inherited, so marking a node marks
//!   every descendant whose mirrored state may have flipped.
//!
//! - **Local-only** — [`TRANSFORM`], [`OPACITY`], [`Z_ORDER`], [`INDEX`], and
//!   [`CLIP`] name a single surface property of a single node. They are
//!   drained once per frame and compared against the last pushed value, so a
//!   property that ends the frame where it started produces no write.
//!
//! Membership sets that are queried between frames (`dirty`,
//! `never_rendered`, `pending_render`, …) live in the render manager as plain
//! hash sets instead.

use understory_dirty::Channel;

/// Resolved transform changed (authored transform, camera, or mirroring).
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed.
pub const OPACITY: Channel = Channel::new(1);

/// Z-order changed.
pub const Z_ORDER: Channel = Channel::new(2);

/// Position among siblings changed.
pub const INDEX: Channel = Channel::new(3);

/// Canvas clipping or children clip path changed.
pub const CLIP: Channel = Channel::new(4);

/// Content direction or mirroring flag changed; propagates to descendants.
pub const MIRROR: Channel = Channel::new(5);

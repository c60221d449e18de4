// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame scheduling and cross-thread invalidation.
//!
//! The scene never flushes on its own. When the first change after a flush
//! arrives it asks the host's [`AnimationScheduler`] for one frame callback;
//! further changes before that callback fires are folded into the same frame.
//! The host answers the callback by calling
//! [`Scene::on_frame`](crate::scene::Scene::on_frame).
//!
//! [`Invalidator`] handles let other threads queue repaint and relayout
//! requests. The queue is drained at the top of the next flush.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use hashbrown::HashSet;

use crate::node::NodeId;

/// A pending frame callback.
pub trait FrameTask: Send {
    /// Cancels the callback if it has not fired yet.
    fn cancel(&self);

    /// Whether the callback has already fired.
    fn is_completed(&self) -> bool {
        false
    }
}

/// Supplies once-per-frame callbacks.
pub trait AnimationScheduler: Send + Sync {
    /// Requests a callback on the next frame.
    fn on_next_frame(&self) -> Box<dyn FrameTask>;
}

/// A scheduler for hosts that pump frames themselves.
///
/// It only counts requests; the host decides when to call
/// [`Scene::on_frame`](crate::scene::Scene::on_frame).
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: AtomicUsize,
}

impl ManualScheduler {
    /// Creates a scheduler with no requests.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: AtomicUsize::new(0),
        }
    }

    /// How many frames have been requested so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl AnimationScheduler for ManualScheduler {
    fn on_next_frame(&self) -> Box<dyn FrameTask> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        Box::new(ManualTask)
    }
}

impl<S: AnimationScheduler + ?Sized> AnimationScheduler for Arc<S> {
    fn on_next_frame(&self) -> Box<dyn FrameTask> {
        (**self).on_next_frame()
    }
}

#[derive(Debug)]
struct ManualTask;

impl FrameTask for ManualTask {
    fn cancel(&self) {}
}

/// What an [`Invalidator`] request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Repaint the node.
    Render,
    /// Lay out the node's children.
    Relayout,
}

/// A queued cross-thread request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Job {
    /// Target node. Requests for nodes that are gone by the flush are dropped.
    pub node: NodeId,
    /// What to do.
    pub kind: JobKind,
}

struct Shared {
    jobs: Mutex<HashSet<Job>>,
    task: Mutex<Option<Box<dyn FrameTask>>>,
    frame_requested: AtomicBool,
    scheduler: Box<dyn AnimationScheduler>,
}

/// A `Send + Sync` handle for requesting work from any thread.
///
/// Requests are deduplicated per `(node, kind)` and applied at the start of
/// the next flush. No request is lost; ordering among concurrent requests is
/// unspecified.
#[derive(Clone)]
pub struct Invalidator {
    shared: Arc<Shared>,
}

impl fmt::Debug for Invalidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invalidator")
            .field(
                "frame_requested",
                &self.shared.frame_requested.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

impl Invalidator {
    pub(crate) fn new(scheduler: Box<dyn AnimationScheduler>) -> Self {
        Self {
            shared: Arc::new(Shared {
                jobs: Mutex::new(HashSet::new()),
                task: Mutex::new(None),
                frame_requested: AtomicBool::new(false),
                scheduler,
            }),
        }
    }

    /// Queues a repaint of `node`.
    pub fn render(&self, node: NodeId) {
        self.push(Job {
            node,
            kind: JobKind::Render,
        });
    }

    /// Queues a relayout of `node`'s children.
    pub fn relayout(&self, node: NodeId) {
        self.push(Job {
            node,
            kind: JobKind::Relayout,
        });
    }

    fn push(&self, job: Job) {
        self.shared
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job);
        self.request_frame();
    }

    /// Asks the scheduler for a frame unless one is already outstanding.
    ///
    /// The task slot is locked across the flag and the store, so a
    /// concurrent [`begin_frame`](Self::begin_frame) sees both or neither.
    pub(crate) fn request_frame(&self) {
        let mut task = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.shared.frame_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        *task = Some(self.shared.scheduler.on_next_frame());
    }

    /// Whether a frame is outstanding.
    #[must_use]
    pub fn frame_requested(&self) -> bool {
        self.shared.frame_requested.load(Ordering::Acquire)
    }

    /// Clears the outstanding-frame flag at the start of a flush.
    pub(crate) fn begin_frame(&self) {
        let mut task = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        task.take();
        self.shared.frame_requested.store(false, Ordering::Release);
    }

    /// Cancels the outstanding frame, if any.
    pub(crate) fn cancel_frame(&self) {
        let mut task = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.cancel();
        }
        self.shared.frame_requested.store(false, Ordering::Release);
    }

    /// Takes every queued job.
    pub(crate) fn drain(&self) -> Vec<Job> {
        core::mem::take(
            &mut *self
                .shared
                .jobs
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
        .into_iter()
        .collect()
    }
}

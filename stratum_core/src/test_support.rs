// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording backend and instrumented collaborators for unit tests.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use hashbrown::HashSet;
use kurbo::{Insets, Size};

use crate::behavior::{AccessibilityManager, Behavior, NodeInfo};
use crate::config::RenderConfig;
use crate::device::{GraphicsSurface, SurfaceFactory, SurfaceProperty, SurfaceRequest, SurfaceValue};
use crate::error::SurfaceError;
use crate::layout::{Layout, LayoutChild};
use crate::node::{ClipPath, NodeId};
use crate::scene::Scene;
use crate::scheduler::ManualScheduler;
use crate::transform::Transform3d;

/// One backend call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Create {
        node: NodeId,
        parent: Option<NodeId>,
        is_container: bool,
        add_to_root: bool,
    },
    Write {
        node: NodeId,
        value: SurfaceValue,
    },
    Render(NodeId),
    Release(NodeId),
}

/// Shared, clonable view of the backend call log.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpLog(Arc<Mutex<Vec<Op>>>);

impl OpLog {
    fn push(&self, op: Op) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    /// Takes everything logged so far.
    pub(crate) fn take(&self) -> Vec<Op> {
        core::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copies everything logged so far.
    pub(crate) fn snapshot(&self) -> Vec<Op> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn count(&self, f: impl Fn(&Op) -> bool) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|op| f(op))
            .count()
    }

    /// Number of writes of `property` to `node`'s surface.
    pub(crate) fn writes(&self, node: NodeId, property: SurfaceProperty) -> usize {
        self.count(|op| {
            matches!(op, Op::Write { node: n, value } if *n == node && value.property() == property)
        })
    }

    /// Values written to `property` of `node`'s surface, in order.
    pub(crate) fn values(&self, node: NodeId, property: SurfaceProperty) -> Vec<SurfaceValue> {
        self.snapshot()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write { node: n, value } if n == node && value.property() == property => {
                    Some(value)
                }
                _ => None,
            })
            .collect()
    }

    pub(crate) fn renders(&self, node: NodeId) -> usize {
        self.count(|op| *op == Op::Render(node))
    }

    pub(crate) fn creates(&self, node: NodeId) -> usize {
        self.count(|op| matches!(op, Op::Create { node: n, .. } if *n == node))
    }

    pub(crate) fn releases(&self, node: NodeId) -> usize {
        self.count(|op| *op == Op::Release(node))
    }
}

#[derive(Debug, Default)]
struct Failures {
    properties: HashSet<SurfaceProperty>,
    create: bool,
}

/// A factory whose surfaces append every call to an [`OpLog`].
#[derive(Debug, Default)]
pub(crate) struct RecordingFactory {
    log: OpLog,
    failures: Arc<Mutex<Failures>>,
    pub(crate) initialized: bool,
    pub(crate) shut_down: Arc<Mutex<bool>>,
}

impl RecordingFactory {
    pub(crate) fn log(&self) -> OpLog {
        self.log.clone()
    }

    /// Makes writes of `property` fail until turned off again.
    pub(crate) fn fail(&self, property: SurfaceProperty, fail: bool) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if fail {
            failures.properties.insert(property);
        } else {
            failures.properties.remove(&property);
        }
    }

    /// Makes surface creation fail until turned off again.
    pub(crate) fn fail_create(&self, fail: bool) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .create = fail;
    }
}

impl SurfaceFactory for RecordingFactory {
    type Surface = RecordingSurface;

    fn create_surface(
        &mut self,
        request: SurfaceRequest<'_, RecordingSurface>,
    ) -> Result<RecordingSurface, SurfaceError> {
        if self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .create
        {
            return Err(SurfaceError::Allocation("test failure".into()));
        }
        self.log.push(Op::Create {
            node: request.node,
            parent: request.parent.map(|p| p.node),
            is_container: request.is_container,
            add_to_root: request.add_to_root,
        });
        Ok(RecordingSurface {
            node: request.node,
            log: self.log.clone(),
            failures: self.failures.clone(),
        })
    }

    fn init(&mut self) {
        self.initialized = true;
    }

    fn shutdown(&mut self) {
        *self.shut_down.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}

/// A surface that records instead of drawing.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    node: NodeId,
    log: OpLog,
    failures: Arc<Mutex<Failures>>,
}

impl RecordingSurface {
    fn write(&self, value: SurfaceValue) -> Result<(), SurfaceError> {
        let property = value.property();
        if self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .properties
            .contains(&property)
        {
            return Err(SurfaceError::Backend("test failure".into()));
        }
        self.log.push(Op::Write {
            node: self.node,
            value,
        });
        Ok(())
    }
}

impl GraphicsSurface for RecordingSurface {
    type Canvas = Vec<NodeId>;

    fn set_bounds(&mut self, bounds: kurbo::Rect) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::Bounds(bounds))
    }

    fn set_transform(&mut self, transform: &Transform3d) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::Transform(*transform))
    }

    fn set_index(&mut self, index: i32) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::Index(index))
    }

    fn set_z_order(&mut self, z_order: i32) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::ZOrder(z_order))
    }

    fn set_opacity(&mut self, opacity: f32) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::Opacity(opacity))
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::Visible(visible))
    }

    fn set_clip_canvas_to_bounds(&mut self, clip: bool) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::ClipCanvasToBounds(clip))
    }

    fn set_children_clip_path(&mut self, clip: Option<&ClipPath>) -> Result<(), SurfaceError> {
        self.write(SurfaceValue::ChildrenClip(clip.cloned()))
    }

    fn render(&mut self, paint: &mut dyn FnMut(&mut Vec<NodeId>)) -> Result<(), SurfaceError> {
        let mut canvas = Vec::new();
        paint(&mut canvas);
        self.log.push(Op::Render(self.node));
        Ok(())
    }

    fn release(&mut self) {
        self.log.push(Op::Release(self.node));
    }
}

/// Counts paints and remembers what it was painted with.
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingBehavior {
    pub(crate) paints: Arc<AtomicUsize>,
    pub(crate) seen: Arc<Mutex<Vec<NodeInfo>>>,
    pub(crate) installed: Arc<Mutex<Vec<NodeId>>>,
}

impl CountingBehavior {
    pub(crate) fn paints(&self) -> usize {
        self.paints.load(Ordering::Relaxed)
    }

    pub(crate) fn last(&self) -> Option<NodeInfo> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl Behavior<Vec<NodeId>> for CountingBehavior {
    fn render(&self, info: &NodeInfo, canvas: &mut Vec<NodeId>) {
        self.paints.fetch_add(1, Ordering::Relaxed);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*info);
        canvas.push(info.id);
    }

    fn install(&mut self, id: NodeId) {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
    }

    fn uninstall(&mut self, id: NodeId) {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|n| *n != id);
    }
}

/// Wraps a layout and appends `label` to a shared list on every pass.
pub(crate) struct TracedLayout<L> {
    pub(crate) inner: L,
    pub(crate) label: &'static str,
    pub(crate) calls: Arc<Mutex<Vec<&'static str>>>,
}

impl<L: Layout> Layout for TracedLayout<L> {
    fn layout(
        &self,
        children: &mut [LayoutChild],
        min: Size,
        current: Size,
        max: Size,
        insets: Insets,
    ) -> Size {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.label);
        self.inner.layout(children, min, current, max, insets)
    }
}

/// Wraps `inner` so every pass is logged under `label`.
pub(crate) fn traced(
    inner: impl Layout + 'static,
    label: &'static str,
    calls: &Arc<Mutex<Vec<&'static str>>>,
) -> Box<dyn Layout> {
    Box::new(TracedLayout {
        inner,
        label,
        calls: calls.clone(),
    })
}

/// Records attach/detach notifications as `(attached, node)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingAccessibility(pub(crate) Arc<Mutex<Vec<(bool, NodeId)>>>);

impl AccessibilityManager for RecordingAccessibility {
    fn node_attached(&mut self, id: NodeId) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((true, id));
    }

    fn node_detached(&mut self, id: NodeId) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((false, id));
    }
}

/// A scene over a recording backend, plus its log and scheduler.
pub(crate) fn scene(size: Size) -> (Scene<RecordingFactory>, OpLog, Arc<ManualScheduler>) {
    scene_with(RenderConfig::new().with_display_size(size))
}

pub(crate) fn scene_with(
    config: RenderConfig,
) -> (Scene<RecordingFactory>, OpLog, Arc<ManualScheduler>) {
    let factory = RecordingFactory::default();
    let log = factory.log();
    let scheduler = Arc::new(ManualScheduler::new());
    (Scene::new(factory, scheduler.clone(), config), log, scheduler)
}

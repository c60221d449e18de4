// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract and surface reconciliation.
//!
//! Every attached node that is eligible to paint owns one backend *surface*.
//! Backends provide two pieces:
//!
//! - **Surface**: implements [`GraphicsSurface`], a write-only handle whose
//!   properties mirror the node's (bounds, transform, index, z-order,
//!   opacity, visibility, clipping) plus a `render` entry point that hands a
//!   canvas to the node's behavior.
//! - **Factory**: implements [`SurfaceFactory`] and creates surfaces nested
//!   under their parent's surface, or at the root for top-level nodes and
//!   popups.
//!
//! [`GraphicsDevice`] sits between the render manager and the factory. It
//! caches the surface of each node, creates parents before children, releases
//! whole surface subtrees at once, and remembers the last value written to
//! each surface property so repeated writes of the same value are skipped.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Rect;

use crate::error::SurfaceError;
use crate::node::{ClipPath, NodeId, NodeStore};
use crate::trace::{FrameTrace, SurfaceAction};
use crate::transform::Transform3d;

/// A backend drawing target owned by one node.
///
/// The engine only writes properties; it never reads them back. A failed
/// write is logged and retried the next time the property changes.
pub trait GraphicsSurface {
    /// What the node's behavior paints into.
    type Canvas: ?Sized;

    /// Position and size in the parent surface's coordinates.
    fn set_bounds(&mut self, bounds: Rect) -> Result<(), SurfaceError>;

    /// Transform applied after positioning, in the parent's coordinates.
    fn set_transform(&mut self, transform: &Transform3d) -> Result<(), SurfaceError>;

    /// Position among sibling surfaces; `-1` for popups.
    fn set_index(&mut self, index: i32) -> Result<(), SurfaceError>;

    /// Stacking order among siblings.
    fn set_z_order(&mut self, z_order: i32) -> Result<(), SurfaceError>;

    /// Opacity in `[0, 1]`.
    fn set_opacity(&mut self, opacity: f32) -> Result<(), SurfaceError>;

    /// Whether the surface is shown.
    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError>;

    /// Whether painting is clipped to the surface's bounds.
    fn set_clip_canvas_to_bounds(&mut self, clip: bool) -> Result<(), SurfaceError>;

    /// Path clipping child surfaces, in local coordinates.
    fn set_children_clip_path(&mut self, clip: Option<&ClipPath>) -> Result<(), SurfaceError>;

    /// Repaints the surface by handing its canvas to `paint`.
    fn render(&mut self, paint: &mut dyn FnMut(&mut Self::Canvas)) -> Result<(), SurfaceError>;

    /// Destroys the backend resources. Called exactly once.
    fn release(&mut self);
}

/// Arguments to [`SurfaceFactory::create_surface`].
#[derive(Debug)]
pub struct SurfaceRequest<'a, S> {
    /// The node the surface is for.
    pub node: NodeId,
    /// The parent node's surface, or `None` at the root.
    pub parent: Option<&'a S>,
    /// Whether the node has children whose surfaces nest inside this one.
    pub is_container: bool,
    /// Whether the surface goes directly under the backend's root.
    pub add_to_root: bool,
}

/// Creates backend surfaces.
pub trait SurfaceFactory {
    /// The surface type this factory produces.
    type Surface: GraphicsSurface;

    /// Creates a surface for `request.node`.
    fn create_surface(
        &mut self,
        request: SurfaceRequest<'_, Self::Surface>,
    ) -> Result<Self::Surface, SurfaceError>;

    /// Called once when a scene starts using this factory.
    ///
    /// Backends install process-wide state here, such as injected styles.
    fn init(&mut self) {}

    /// Called once when the scene is dropped.
    fn shutdown(&mut self) {}
}

/// The canvas type a factory's surfaces paint into.
pub type CanvasOf<F> = <<F as SurfaceFactory>::Surface as GraphicsSurface>::Canvas;

/// A surface property, for logs and traces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceProperty {
    /// [`GraphicsSurface::set_bounds`].
    Bounds,
    /// [`GraphicsSurface::set_transform`].
    Transform,
    /// [`GraphicsSurface::set_index`].
    Index,
    /// [`GraphicsSurface::set_z_order`].
    ZOrder,
    /// [`GraphicsSurface::set_opacity`].
    Opacity,
    /// [`GraphicsSurface::set_visible`].
    Visible,
    /// [`GraphicsSurface::set_clip_canvas_to_bounds`].
    ClipCanvasToBounds,
    /// [`GraphicsSurface::set_children_clip_path`].
    ChildrenClip,
}

/// A value to push to one surface property.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceValue {
    /// New bounds.
    Bounds(Rect),
    /// New transform.
    Transform(Transform3d),
    /// New sibling index.
    Index(i32),
    /// New z-order.
    ZOrder(i32),
    /// New opacity.
    Opacity(f32),
    /// New visibility.
    Visible(bool),
    /// New canvas clipping flag.
    ClipCanvasToBounds(bool),
    /// New children clip path.
    ChildrenClip(Option<ClipPath>),
}

impl SurfaceValue {
    /// Which property this value targets.
    #[must_use]
    pub fn property(&self) -> SurfaceProperty {
        match self {
            Self::Bounds(_) => SurfaceProperty::Bounds,
            Self::Transform(_) => SurfaceProperty::Transform,
            Self::Index(_) => SurfaceProperty::Index,
            Self::ZOrder(_) => SurfaceProperty::ZOrder,
            Self::Opacity(_) => SurfaceProperty::Opacity,
            Self::Visible(_) => SurfaceProperty::Visible,
            Self::ClipCanvasToBounds(_) => SurfaceProperty::ClipCanvasToBounds,
            Self::ChildrenClip(_) => SurfaceProperty::ChildrenClip,
        }
    }
}

/// The last value successfully written to each property of one surface.
///
/// `None` means the property has never been written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PushedState {
    /// Last bounds.
    pub bounds: Option<Rect>,
    /// Last transform.
    pub transform: Option<Transform3d>,
    /// Last sibling index.
    pub index: Option<i32>,
    /// Last z-order.
    pub z_order: Option<i32>,
    /// Last opacity.
    pub opacity: Option<f32>,
    /// Last visibility.
    pub visible: Option<bool>,
    /// Last canvas clipping flag.
    pub clip_canvas_to_bounds: Option<bool>,
    /// Last children clip path.
    pub children_clip: Option<Option<ClipPath>>,
}

/// What happened to a push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// The surface already had this value.
    Skipped,
    /// The value was written.
    Written,
    /// The backend rejected the write.
    Failed(SurfaceError),
    /// The node has no surface.
    NoSurface,
}

struct SurfaceEntry<S> {
    surface: S,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pushed: PushedState,
}

/// Maps nodes to their backend surfaces.
pub struct GraphicsDevice<F: SurfaceFactory> {
    factory: F,
    entries: HashMap<NodeId, SurfaceEntry<F::Surface>>,
}

impl<F: SurfaceFactory> fmt::Debug for GraphicsDevice<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("surfaces", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<F: SurfaceFactory> GraphicsDevice<F> {
    /// Wraps a factory.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            entries: HashMap::new(),
        }
    }

    /// The wrapped factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The wrapped factory, mutably.
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no surface is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` currently owns a surface.
    #[must_use]
    pub fn has_surface(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// The cached surface of `id`, if any.
    #[must_use]
    pub fn surface(&self, id: NodeId) -> Option<&F::Surface> {
        self.entries.get(&id).map(|e| &e.surface)
    }

    /// The last values pushed to `id`'s surface.
    #[must_use]
    pub fn pushed(&self, id: NodeId) -> Option<&PushedState> {
        self.entries.get(&id).map(|e| &e.pushed)
    }

    /// Returns the surface of `id`, creating it and any missing ancestor
    /// surfaces first.
    ///
    /// Returns `false` when the factory failed; the failure is logged and the
    /// node is skipped for this frame.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub(crate) fn surface_for(
        &mut self,
        store: &NodeStore,
        id: NodeId,
        trace: &mut FrameTrace<'_>,
    ) -> bool {
        store.validate(id);
        if self.entries.contains_key(&id) {
            return true;
        }

        // Missing surfaces from the nearest cached ancestor down to `id`.
        let mut chain = alloc::vec![id];
        for ancestor in store.ancestors(id) {
            if self.entries.contains_key(&ancestor) {
                break;
            }
            chain.push(ancestor);
        }

        for node in chain.into_iter().rev() {
            let parent = store.parent(node);
            let request = SurfaceRequest {
                node,
                parent: parent.and_then(|p| self.entries.get(&p)).map(|e| &e.surface),
                is_container: !store.children(node).is_empty() || store.has_layout(node),
                add_to_root: parent.is_none(),
            };
            let surface = match self.factory.create_surface(request) {
                Ok(surface) => surface,
                Err(err) => {
                    log::warn!("creating surface for {node:?} failed: {err}");
                    return false;
                }
            };
            log::debug!("created surface for {node:?}");
            trace.surface(node, SurfaceAction::Created);
            if let Some(p) = parent
                && let Some(entry) = self.entries.get_mut(&p)
            {
                entry.children.push(node);
            }
            self.entries.insert(
                node,
                SurfaceEntry {
                    surface,
                    parent,
                    children: Vec::new(),
                    pushed: PushedState::default(),
                },
            );
            if !store.is_popup(node) {
                let outcome = self.push(node, SurfaceValue::ZOrder(store.z_order(node)));
                trace.pushed(node, SurfaceProperty::ZOrder, &outcome);
            }
        }
        true
    }

    /// Releases the surface of `id` and every cached descendant surface.
    ///
    /// Returns the nodes whose surfaces were released, parents first.
    pub(crate) fn release(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut released = Vec::new();
        let Some(entry) = self.entries.get(&id) else {
            return released;
        };
        if let Some(p) = entry.parent
            && let Some(parent) = self.entries.get_mut(&p)
        {
            parent.children.retain(|c| *c != id);
        }
        let mut stack = alloc::vec![id];
        while let Some(node) = stack.pop() {
            if let Some(mut entry) = self.entries.remove(&node) {
                entry.surface.release();
                log::debug!("released surface for {node:?}");
                stack.extend(entry.children.iter().rev().copied());
                released.push(node);
            }
        }
        released
    }

    /// Releases every surface.
    pub(crate) fn release_all(&mut self) {
        for (node, mut entry) in self.entries.drain() {
            entry.surface.release();
            log::debug!("released surface for {node:?}");
        }
    }

    /// Writes `value` to `id`'s surface unless it already holds it.
    ///
    /// A failed write is logged and leaves the remembered value untouched, so
    /// the next push of any value retries.
    pub(crate) fn push(&mut self, id: NodeId, value: SurfaceValue) -> PushOutcome {
        let Some(entry) = self.entries.get_mut(&id) else {
            return PushOutcome::NoSurface;
        };
        let property = value.property();
        let pushed = &mut entry.pushed;
        let surface = &mut entry.surface;
        let result = match value {
            SurfaceValue::Bounds(v) => write(&mut pushed.bounds, v, |v| surface.set_bounds(*v)),
            SurfaceValue::Transform(v) => {
                write(&mut pushed.transform, v, |v| surface.set_transform(v))
            }
            SurfaceValue::Index(v) => write(&mut pushed.index, v, |v| surface.set_index(*v)),
            SurfaceValue::ZOrder(v) => write(&mut pushed.z_order, v, |v| surface.set_z_order(*v)),
            SurfaceValue::Opacity(v) => write(&mut pushed.opacity, v, |v| surface.set_opacity(*v)),
            SurfaceValue::Visible(v) => write(&mut pushed.visible, v, |v| surface.set_visible(*v)),
            SurfaceValue::ClipCanvasToBounds(v) => write(&mut pushed.clip_canvas_to_bounds, v, |v| {
                surface.set_clip_canvas_to_bounds(*v)
            }),
            SurfaceValue::ChildrenClip(v) => write(&mut pushed.children_clip, v, |v| {
                surface.set_children_clip_path(v.as_ref())
            }),
        };
        match result {
            None => PushOutcome::Skipped,
            Some(Ok(())) => {
                log::trace!("pushed {property:?} to {id:?}");
                PushOutcome::Written
            }
            Some(Err(err)) => {
                log::warn!("pushing {property:?} to {id:?} failed: {err}");
                PushOutcome::Failed(err)
            }
        }
    }

    /// Hands `id`'s canvas to `paint`.
    pub(crate) fn render(
        &mut self,
        id: NodeId,
        paint: &mut dyn FnMut(&mut CanvasOf<F>),
    ) -> Result<(), SurfaceError> {
        match self.entries.get_mut(&id) {
            Some(entry) => entry.surface.render(paint),
            None => Ok(()),
        }
    }
}

/// Writes `value` through `apply` unless `slot` already holds it.
///
/// Returns `None` when skipped.
fn write<T: PartialEq>(
    slot: &mut Option<T>,
    value: T,
    apply: impl FnOnce(&T) -> Result<(), SurfaceError>,
) -> Option<Result<(), SurfaceError>> {
    if slot.as_ref() == Some(&value) {
        return None;
    }
    let result = apply(&value);
    if result.is_ok() {
        *slot = Some(value);
    }
    Some(result)
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The public mutation surface.
//!
//! [`Scene`] owns the node store, the render manager's bookkeeping, and the
//! graphics device. Every setter writes the store and forwards the change to
//! the render manager; none of them calls the backend. Backend work happens
//! in [`Scene::on_frame`].
//!
//! Property setters panic on stale handles, like the store's getters.
//! Structural operations (children, popups, destroy) validate everything up
//! front and return a [`SceneError`] without changing anything.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Insets, Point, Rect, Size};

use crate::behavior::{AccessibilityManager, Behavior, ThemeManager};
use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::device::{CanvasOf, GraphicsDevice, SurfaceFactory};
use crate::dirty;
use crate::error::SceneError;
use crate::event::{DisplayEvents, NodeEvents};
use crate::layout::{Layout, SizePreferences};
use crate::node::{ClipPath, Container, ContentDirection, NodeId, NodeStore};
use crate::render::RenderManager;
use crate::scheduler::{AnimationScheduler, Invalidator};
use crate::transform::Transform3d;

/// A painting behavior for the canvases of `F`'s surfaces.
pub type BoxedBehavior<F> = Box<dyn Behavior<CanvasOf<F>>>;

/// A retained scene: nodes, the display they hang from, and the machinery
/// that turns mutations into batched backend updates.
pub struct Scene<F: SurfaceFactory> {
    pub(crate) store: NodeStore,
    pub(crate) device: GraphicsDevice<F>,
    pub(crate) manager: RenderManager,
    pub(crate) behaviors: HashMap<NodeId, BoxedBehavior<F>>,
    pub(crate) invalidator: Invalidator,
    pub(crate) accessibility: Option<Box<dyn AccessibilityManager>>,
    pub(crate) theme: Option<Box<dyn ThemeManager>>,
    pub(crate) config: RenderConfig,
}

impl<F: SurfaceFactory> fmt::Debug for Scene<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("store", &self.store)
            .field("device", &self.device)
            .field("frame_index", &self.manager.frame_index)
            .finish_non_exhaustive()
    }
}

impl<F: SurfaceFactory> Scene<F> {
    /// Creates an empty scene drawing through `factory`.
    pub fn new(
        mut factory: F,
        scheduler: impl AnimationScheduler + 'static,
        config: RenderConfig,
    ) -> Self {
        factory.init();
        Self {
            store: NodeStore::new(
                config.display_size,
                config.content_direction,
                config.mirror_when_right_to_left,
            ),
            device: GraphicsDevice::new(factory),
            manager: RenderManager::new(),
            behaviors: HashMap::new(),
            invalidator: Invalidator::new(Box::new(scheduler)),
            accessibility: None,
            theme: None,
            config,
        }
    }

    /// Read access to every node.
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// The graphics device and its surfaces.
    #[must_use]
    pub fn device(&self) -> &GraphicsDevice<F> {
        &self.device
    }

    /// The configuration this scene was created with.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// A handle for requesting work from other threads.
    #[must_use]
    pub fn invalidator(&self) -> Invalidator {
        self.invalidator.clone()
    }

    /// Whether a frame has been requested and not yet flushed.
    #[must_use]
    pub fn frame_requested(&self) -> bool {
        self.invalidator.frame_requested()
    }

    /// Installs the accessibility collaborator.
    pub fn set_accessibility(&mut self, manager: Option<Box<dyn AccessibilityManager>>) {
        self.accessibility = manager;
    }

    /// Installs the theme collaborator.
    pub fn set_theme(&mut self, manager: Option<Box<dyn ThemeManager>>) {
        self.theme = manager;
    }

    // -- Nodes --

    /// Creates a detached node.
    pub fn create_node(&mut self) -> NodeId {
        self.store.create_node()
    }

    /// Destroys a detached node and its subtree.
    ///
    /// Surfaces still held by the subtree are released at the next flush.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.store.check(id)?;
        if self.store.container_of(id).is_some() || self.store.is_popup(id) {
            return Err(SceneError::NotDetached(id));
        }
        let owner = self
            .manager
            .cleanup_owner(id)
            .unwrap_or(Container::Display);
        self.manager.living.remove(&id);
        self.release_resources(owner, id);
        for n in self.store.destroy_subtree(id) {
            self.manager.added_invisible.remove(&n);
            if let Some(mut behavior) = self.behaviors.remove(&n) {
                behavior.uninstall(n);
            }
        }
        if !self.manager.pending_release.is_empty() {
            self.schedule_paint();
        }
        Ok(())
    }

    /// The node's event channels.
    pub fn events_mut(&mut self, id: NodeId) -> &mut NodeEvents {
        self.store.events_mut(id)
    }

    /// The display's event channels.
    pub fn display_events_mut(&mut self) -> &mut DisplayEvents {
        self.store.display.events_mut()
    }

    // -- Node properties --

    /// Sets bounds in the parent's coordinates.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        self.apply_bounds(id, bounds);
    }

    /// Moves the node, keeping its size.
    pub fn set_position(&mut self, id: NodeId, position: Point) {
        let size = self.store.size(id);
        self.apply_bounds(id, Rect::from_origin_size(position, size));
    }

    /// Resizes the node, keeping its position.
    pub fn set_size(&mut self, id: NodeId, size: Size) {
        let origin = self.store.position(id);
        self.apply_bounds(id, Rect::from_origin_size(origin, size));
    }

    /// Sets the authored transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform3d) {
        if self.store.set_transform(id, transform).is_some() {
            self.geometry_changed(id);
        }
    }

    /// Sets or clears the camera.
    pub fn set_camera(&mut self, id: NodeId, camera: Option<Camera>) {
        if self.store.set_camera(id, camera).is_some() {
            self.geometry_changed(id);
        }
    }

    fn geometry_changed(&mut self, id: NodeId) {
        if self.manager.views.contains(&id) {
            self.manager.pending_bounds.insert(id);
        }
        self.surface_property_changed(id, dirty::TRANSFORM);
    }

    /// Shows or hides the node.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if self.store.set_visible(id, visible).is_some() {
            self.visibility_changed(id, visible);
        }
    }

    /// Sets the opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) {
        if self.store.set_opacity(id, opacity).is_some() {
            self.surface_property_changed(id, dirty::OPACITY);
        }
    }

    /// Sets the z-order among siblings. Ignored by popup surfaces.
    pub fn set_z_order(&mut self, id: NodeId, z_order: i32) {
        if self.store.set_z_order(id, z_order).is_some() && !self.store.is_popup(id) {
            self.surface_property_changed(id, dirty::Z_ORDER);
        }
    }

    /// Sets whether painting is clipped to the node's bounds.
    pub fn set_clip_canvas_to_bounds(&mut self, id: NodeId, clip: bool) {
        if self.store.set_clip_canvas_to_bounds(id, clip).is_some() {
            self.surface_property_changed(id, dirty::CLIP);
        }
    }

    /// Sets or clears the path clipping the node's children.
    pub fn set_children_clip(&mut self, id: NodeId, clip: Option<ClipPath>) {
        if self.store.set_children_clip(id, clip).is_some() {
            self.surface_property_changed(id, dirty::CLIP);
        }
    }

    /// Replaces both size hints.
    pub fn set_size_preferences(&mut self, id: NodeId, preferences: SizePreferences) {
        if let Some(old) = self.store.set_size_preferences(id, preferences) {
            self.size_preferences_changed(id, &old, &preferences);
        }
    }

    /// Sets the ideal size hint.
    pub fn set_ideal_size(&mut self, id: NodeId, ideal: Option<Size>) {
        let preferences = SizePreferences {
            ideal,
            ..self.store.size_preferences(id)
        };
        self.set_size_preferences(id, preferences);
    }

    /// Sets the minimum size hint.
    pub fn set_minimum_size(&mut self, id: NodeId, minimum: Size) {
        let preferences = SizePreferences {
            minimum,
            ..self.store.size_preferences(id)
        };
        self.set_size_preferences(id, preferences);
    }

    /// Sets or clears the node's content-direction override.
    pub fn set_content_direction(&mut self, id: NodeId, direction: Option<ContentDirection>) {
        if self.store.set_content_direction(id, direction).is_some() {
            self.mirroring_changed();
        }
    }

    /// Sets whether the node mirrors when right-to-left.
    pub fn set_mirror_when_right_to_left(&mut self, id: NodeId, mirror: bool) {
        if self.store.set_mirror_when_right_to_left(id, mirror).is_some() {
            self.mirroring_changed();
        }
    }

    /// Turns display-rect notifications on or off.
    pub fn set_monitors_display_rect(&mut self, id: NodeId, monitors: bool) {
        if self.store.set_monitors_display_rect(id, monitors).is_none() {
            return;
        }
        if !monitors {
            self.stop_monitoring(id);
        } else if self.manager.views.contains(&id) {
            self.start_monitoring(id);
        }
    }

    /// Sets the insets handed to the node's layout.
    pub fn set_insets(&mut self, id: NodeId, insets: Insets) {
        if self.store.set_insets(id, insets).is_some() {
            self.schedule_layout(Container::Node(id));
        }
    }

    /// Installs or removes the node's layout.
    pub fn set_layout(&mut self, id: NodeId, layout: Option<Box<dyn Layout>>) {
        self.store.set_layout(id, layout);
        self.schedule_layout(Container::Node(id));
    }

    /// Installs or removes the node's painting behavior.
    pub fn set_behavior(&mut self, id: NodeId, behavior: Option<BoxedBehavior<F>>) {
        self.store.validate(id);
        if let Some(mut old) = self.behaviors.remove(&id) {
            old.uninstall(id);
        }
        if let Some(mut behavior) = behavior {
            behavior.install(id);
            self.behaviors.insert(id, behavior);
        }
        self.render_node(id, false);
    }

    // -- Display --

    /// Resizes the display.
    pub fn set_display_size(&mut self, size: Size) {
        let old = core::mem::replace(&mut self.store.display.size, size);
        if old != size {
            self.display_resized(old, size);
        }
    }

    /// Installs or removes the display's layout.
    pub fn set_display_layout(&mut self, layout: Option<Box<dyn Layout>>) {
        self.store.display.layout = layout;
        self.schedule_layout(Container::Display);
    }

    /// Sets the insets handed to the display's layout.
    pub fn set_display_insets(&mut self, insets: Insets) {
        if core::mem::replace(&mut self.store.display.insets, insets) != insets {
            self.schedule_layout(Container::Display);
        }
    }

    /// Sets the display's content direction.
    pub fn set_display_content_direction(&mut self, direction: ContentDirection) {
        if self.store.set_display_content_direction(direction) {
            self.mirroring_changed();
        }
    }

    /// Sets whether the display mirrors when right-to-left.
    pub fn set_display_mirror_when_right_to_left(&mut self, mirror: bool) {
        if self.store.set_display_mirror_when_right_to_left(mirror) {
            self.mirroring_changed();
        }
    }

    // -- Children --

    /// The children of `container`.
    ///
    /// # Panics
    ///
    /// Panics if the container is a stale node.
    #[must_use]
    pub fn children(&self, container: impl Into<Container>) -> &[NodeId] {
        self.store.children_of(container.into())
    }

    fn current_children(&self, container: Container) -> Result<Vec<NodeId>, SceneError> {
        if let Container::Node(c) = container {
            self.store.check(c)?;
        }
        Ok(self.store.children_of(container).to_vec())
    }

    /// Inserts `child` at `index`, moving it if it is already a child.
    ///
    /// `index` refers to the list without `child`.
    pub fn insert_child(
        &mut self,
        container: impl Into<Container>,
        index: usize,
        child: NodeId,
    ) -> Result<(), SceneError> {
        let container = container.into();
        let mut list = self.current_children(container)?;
        self.store.check_insert(container, child)?;
        list.retain(|c| *c != child);
        if index > list.len() {
            return Err(SceneError::IndexOutOfBounds {
                index,
                len: list.len(),
            });
        }
        list.insert(index, child);
        self.apply_children(container, list)
    }

    /// Appends `child`, moving it to the end if it is already a child.
    pub fn add_child(
        &mut self,
        container: impl Into<Container>,
        child: NodeId,
    ) -> Result<(), SceneError> {
        let container = container.into();
        let mut list = self.current_children(container)?;
        self.store.check_insert(container, child)?;
        list.retain(|c| *c != child);
        list.push(child);
        self.apply_children(container, list)
    }

    /// Removes `child`.
    pub fn remove_child(
        &mut self,
        container: impl Into<Container>,
        child: NodeId,
    ) -> Result<(), SceneError> {
        let container = container.into();
        let mut list = self.current_children(container)?;
        let Some(at) = list.iter().position(|c| *c == child) else {
            return Err(SceneError::NotAChild(child));
        };
        list.remove(at);
        self.apply_children(container, list)
    }

    /// Moves `child` to index `to`.
    pub fn move_child(
        &mut self,
        container: impl Into<Container>,
        child: NodeId,
        to: usize,
    ) -> Result<(), SceneError> {
        let container = container.into();
        let mut list = self.current_children(container)?;
        let Some(from) = list.iter().position(|c| *c == child) else {
            return Err(SceneError::NotAChild(child));
        };
        if to >= list.len() {
            return Err(SceneError::IndexOutOfBounds {
                index: to,
                len: list.len(),
            });
        }
        list.remove(from);
        list.insert(to, child);
        self.apply_children(container, list)
    }

    /// Puts `new` where `old` was.
    pub fn replace_child(
        &mut self,
        container: impl Into<Container>,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), SceneError> {
        let container = container.into();
        let list = self.current_children(container)?;
        self.store.check_insert(container, new)?;
        if !list.contains(&old) {
            return Err(SceneError::NotAChild(old));
        }
        let list = list
            .into_iter()
            .filter(|c| *c != new)
            .map(|c| if c == old { new } else { c })
            .collect();
        self.apply_children(container, list)
    }

    /// Replaces the whole children list.
    pub fn set_children(
        &mut self,
        container: impl Into<Container>,
        children: Vec<NodeId>,
    ) -> Result<(), SceneError> {
        let container = container.into();
        self.current_children(container)?;
        self.apply_children(container, children)
    }

    /// Removes every child.
    pub fn clear_children(&mut self, container: impl Into<Container>) -> Result<(), SceneError> {
        self.set_children(container, Vec::new())
    }

    fn apply_children(
        &mut self,
        container: Container,
        children: Vec<NodeId>,
    ) -> Result<(), SceneError> {
        let popups: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|id| self.store.is_alive(*id) && self.store.is_popup(*id))
            .collect();
        // Validates every id before detaching anything, popups included.
        let changes = self.store.apply_children(container, children)?;
        for id in popups {
            self.child_removed(Container::Display, id);
        }
        for change in &changes {
            self.children_changed(change);
        }
        self.mirroring_changed();
        Ok(())
    }

    // -- Popups --

    /// Shows a detached node as a popup above every top-level node.
    pub fn show_popup(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.store.attach_popup(id)?;
        self.child_added(Container::Display, id);
        self.surface_property_changed(id, dirty::INDEX);
        self.mirroring_changed();
        Ok(())
    }

    /// Hides a popup, detaching it.
    pub fn hide_popup(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.store.check(id)?;
        if !self.store.detach_popup(id) {
            return Err(SceneError::NotAPopup(id));
        }
        self.child_removed(Container::Display, id);
        self.mirroring_changed();
        Ok(())
    }

    // -- Requests --

    /// Repaints `id` at the next frame.
    pub fn rerender(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.store.check(id)?;
        if !self.store.displayed(id) {
            return Err(SceneError::NotAttached(id));
        }
        self.render_node(id, false);
        Ok(())
    }

    /// Lays out `id`'s children at the next frame.
    pub fn relayout(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.store.check(id)?;
        self.schedule_layout(Container::Node(id));
        Ok(())
    }

    /// Lays out `container` immediately.
    ///
    /// A node is laid out only when it is displayed, non-empty, and has
    /// children. Bounds produced here reach the backend at the next frame.
    /// Returns whether the layout ran.
    pub fn layout_now(&mut self, container: impl Into<Container>) -> Result<bool, SceneError> {
        let container = container.into();
        if let Container::Node(id) = container {
            self.store.check(id)?;
        }
        Ok(self.layout_if_ready(container))
    }
}

impl<F: SurfaceFactory> Drop for Scene<F> {
    fn drop(&mut self) {
        self.invalidator.cancel_frame();
        for (id, behavior) in &mut self.behaviors {
            behavior.uninstall(*id);
        }
        self.device.release_all();
        self.device.factory_mut().shutdown();
    }
}

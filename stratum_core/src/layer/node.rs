// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer record: geometry, flags, dirty state and body.

use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::content::{Background, LayerContent, SharedContent};
use super::dirty::DirtyState;
use super::id::WindowId;
use crate::geometry::Rect;

/// A positioned rectangle in a window's layer stack.
///
/// Layers are built standalone, handed to
/// [`Compositor::create_layer`](crate::compositor::Compositor::create_layer),
/// and then mutated through the compositor while they are attached. The
/// dirty-region methods here are also usable on a detached layer.
pub struct Layer {
    name: String,
    bounds: Rect,
    dirty: DirtyState,
    visible: bool,
    opaque: bool,
    supports_input: bool,
    background: Background,
    owner: Option<WindowId>,
    content: Option<SharedContent>,
}

/// Frame-local copy of an attached layer taken by
/// [`Layer::snapshot_and_clear`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyCopy {
    /// Layer bounds at snapshot time.
    pub bounds: Rect,
    /// Resolved dirty rectangle in layer-local coordinates.
    pub dirty: Rect,
}

impl Layer {
    /// Creates a visible, opaque layer with no background and no body.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            bounds,
            dirty: DirtyState::Clean,
            visible: true,
            opaque: true,
            supports_input: false,
            background: Background::None,
            owner: None,
            content: None,
        }
    }

    /// Sets the paint body.
    #[must_use]
    pub fn with_content(mut self, content: impl LayerContent + 'static) -> Self {
        self.content = Some(Arc::new(Mutex::new(content)));
        self
    }

    /// Sets the paint body from an existing shared handle.
    #[must_use]
    pub fn with_shared_content(mut self, content: SharedContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Sets the background.
    #[must_use]
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Sets whether the layer fully covers its bounds when painted.
    #[must_use]
    pub fn with_opaque(mut self, opaque: bool) -> Self {
        self.opaque = opaque;
        self
    }

    /// Sets initial visibility.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets whether the layer takes pointer input.
    #[must_use]
    pub fn with_input(mut self, supports_input: bool) -> Self {
        self.supports_input = supports_input;
        self
    }

    // -- Getters --

    /// Diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position and size in window coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Current dirty state.
    #[must_use]
    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    /// Returns `true` if any part of the layer needs repainting.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Resolved dirty rectangle in layer-local coordinates.
    #[must_use]
    pub fn dirty_rect(&self) -> Option<Rect> {
        self.dirty.resolve(self.bounds.width, self.bounds.height)
    }

    /// Whether the layer is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the layer fully covers its bounds.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Whether nothing is painted behind the body.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.background.is_transparent()
    }

    /// Whether the layer takes pointer input.
    #[must_use]
    pub fn supports_input(&self) -> bool {
        self.supports_input
    }

    /// Background description.
    #[must_use]
    pub fn background(&self) -> Background {
        self.background
    }

    /// The window this layer is attached to, if any.
    #[must_use]
    pub fn owner(&self) -> Option<WindowId> {
        self.owner
    }

    /// Shared handle to the paint body.
    #[must_use]
    pub fn content(&self) -> Option<&SharedContent> {
        self.content.as_ref()
    }

    // -- Dirty-region algebra --

    /// Marks the whole layer dirty, discarding any partial rectangle.
    pub fn mark_dirty(&mut self) {
        tracing::trace!(layer = %self.name, "whole layer dirty");
        self.dirty = DirtyState::Full;
    }

    /// Adds `region` (layer-local) to the dirty area.
    ///
    /// The region may extend past the layer; only the overlapping part
    /// counts. Returns `true` if the dirty area changed.
    pub fn mark_region_dirty(&mut self, region: Rect) -> bool {
        let changed = self
            .dirty
            .add(region, self.bounds.width, self.bounds.height);
        if changed {
            tracing::trace!(layer = %self.name, ?region, dirty = ?self.dirty, "dirty region grown");
        }
        changed
    }

    /// Adds the pixels touched by `shape` (layer-local) to the dirty area.
    ///
    /// For vector content. The shape's bounding box is rounded outward to
    /// whole pixels. Returns `true` if the dirty area changed.
    pub fn mark_shape_dirty(&mut self, shape: &impl kurbo::Shape) -> bool {
        self.mark_region_dirty(Rect::from_kurbo_outer(shape.bounding_box()))
    }

    /// Removes `region` (layer-local) from the dirty area.
    ///
    /// Declined, returning `false`, when the remainder would not be a single
    /// rectangle.
    pub fn clear_region_dirty(&mut self, region: Rect) -> bool {
        self.dirty
            .subtract(region, self.bounds.width, self.bounds.height)
    }

    /// Drops all dirty state.
    pub fn clean(&mut self) {
        self.dirty = DirtyState::Clean;
    }

    /// Copies bounds and the resolved dirty rectangle, then cleans the layer.
    ///
    /// Returns `None` for a clean layer. Call only with the owning stack
    /// locked.
    pub fn snapshot_and_clear(&mut self) -> Option<DirtyCopy> {
        let dirty = self.dirty_rect()?;
        self.dirty = DirtyState::Clean;
        Some(DirtyCopy {
            bounds: self.bounds,
            dirty,
        })
    }

    // -- Mutation --

    /// Moves or resizes the layer.
    ///
    /// A dirty layer whose size changes becomes fully dirty, keeping its
    /// dirty rectangle inside the new extent.
    pub fn set_bounds(&mut self, bounds: Rect) {
        let resized = bounds.size() != self.bounds.size();
        self.bounds = bounds;
        if resized && self.dirty.is_dirty() {
            self.dirty = DirtyState::Full;
        }
    }

    /// Shows or hides the layer; either way the whole layer becomes dirty.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.mark_dirty();
    }

    /// Sets whether the layer fully covers its bounds.
    pub fn set_opaque(&mut self, opaque: bool) {
        self.opaque = opaque;
    }

    /// Replaces the background and marks the layer dirty.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        self.mark_dirty();
    }

    /// Sets whether the layer takes pointer input.
    pub fn set_supports_input(&mut self, supports_input: bool) {
        self.supports_input = supports_input;
    }

    pub(crate) fn set_owner(&mut self, owner: Option<WindowId>) {
        self.owner = owner;
    }

    // -- Geometry --

    /// Visible hit-test against a window-space point.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.visible && self.bounds.contains_point(x, y)
    }

    /// Returns `true` if the two layers' bounds overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.bounds.intersects(&other.bounds)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("bounds", &self.bounds)
            .field("dirty", &self.dirty)
            .field("visible", &self.visible)
            .field("opaque", &self.opaque)
            .field("supports_input", &self.supports_input)
            .field("background", &self.background)
            .field("owner", &self.owner)
            .field("content", &self.content.is_some())
            .finish()
    }
}

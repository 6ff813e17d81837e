// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer backgrounds and the paint callback contract.

use std::sync::Arc;

use parking_lot::Mutex;

use super::id::WindowId;
use crate::error::PaintResult;
use crate::geometry::Rect;
use crate::surface::{Color, ImageId, Surface};

/// What a layer paints underneath its body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Background {
    /// No background at all: the layer is transparent.
    #[default]
    None,
    /// Solid fill of the dirty area.
    Color(Color),
    /// An image covering the layer, centred or tiled over `color`.
    Image {
        /// Background image.
        image: ImageId,
        /// Tile instead of centring.
        tile: bool,
        /// Fill painted under the image.
        color: Color,
    },
}

impl Background {
    /// Returns `true` if nothing is painted behind the body.
    #[inline]
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Paints the background of a layer of the given size into `surface`.
    ///
    /// `surface` must already be translated into layer space and clipped to
    /// the area being repainted.
    pub fn paint(&self, surface: &mut dyn Surface, size: Rect) {
        match *self {
            Self::None => {}
            Self::Color(color) => {
                surface.set_color(color);
                let clip = surface.clip();
                surface.fill_rect(clip);
            }
            Self::Image { image, tile, color } => {
                surface.set_color(color);
                let clip = surface.clip();
                surface.fill_rect(clip);
                surface.draw_image(image, size, tile);
            }
        }
    }
}

/// The body of a layer: its paint callback and lifecycle hooks.
///
/// The compositor invokes [`paint_body`](Self::paint_body) with the surface
/// already translated to the layer origin and clipped to the dirty area. The
/// stack lock is *not* held during the call, so implementations may freely
/// mark layers dirty; those marks land in the next frame.
///
/// The notification hooks run after the stack lock is released. A body may
/// add, remove or relocate its own layer from inside `paint_body` (a popup
/// dismissing itself, say); the resulting notification is delivered once the
/// paint pass finishes.
pub trait LayerContent: Send {
    /// Draws the layer body. `size` is the layer extent at the origin.
    fn paint_body(&mut self, surface: &mut dyn Surface, size: Rect) -> PaintResult;

    /// Called after the layer was added to `window`'s stack.
    fn attached(&mut self, window: WindowId) {
        _ = window;
    }

    /// Called after the layer was removed from `window`'s stack.
    fn detached(&mut self, window: WindowId) {
        _ = window;
    }

    /// Called after the layer moved; `old_bounds` is where it used to be.
    fn relocated(&mut self, old_bounds: Rect) {
        _ = old_bounds;
    }
}

/// Shared handle to a layer body.
///
/// Shared so the paint pass can run a body after the stack lock is released.
pub type SharedContent = Arc<Mutex<dyn LayerContent>>;

/// Paints one layer: background, then body, restoring colour and font around
/// each step.
pub(crate) fn paint_layer(
    surface: &mut dyn Surface,
    background: &Background,
    content: Option<&SharedContent>,
    size: Rect,
) -> PaintResult {
    let color = surface.color();
    let font = surface.font();

    background.paint(surface, size);
    surface.set_color(color);
    surface.set_font(font);

    let result = match content {
        Some(content) => content.lock().paint_body(surface, size),
        None => Ok(()),
    };
    surface.set_color(color);
    surface.set_font(font);
    result
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing capability consumed by the paint pass.
//!
//! Stratum does not rasterize anything itself. Hosts hand the compositor a
//! [`Surface`], an immediate-mode 2D canvas with a movable origin and a
//! rectangular clip. Clip rectangles are always expressed relative to the
//! current translation, so a layer painting at `(0, 0)` draws at its own
//! top-left corner regardless of where it sits on screen.
//!
//! [`RecordingSurface`] is an in-memory implementation that logs clipped
//! draw operations in absolute coordinates. Headless hosts and tests use it
//! to observe exactly what a frame touched.

use core::fmt;

use crate::geometry::Rect;

/// A packed `0xRRGGBB` colour.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self(0x00_00_00);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFF_FF_FF);
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:06x})", self.0)
    }
}

/// An opaque reference to a font managed by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

/// An opaque reference to an image managed by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

/// Immediate-mode canvas with translation and clipping.
pub trait Surface {
    /// Current origin offset, in absolute coordinates.
    fn translation(&self) -> (i32, i32);

    /// Moves the origin by `(dx, dy)`.
    fn translate(&mut self, dx: i32, dy: i32);

    /// Current clip, relative to the current origin.
    fn clip(&self) -> Rect;

    /// Replaces the clip. `rect` is relative to the current origin.
    fn set_clip(&mut self, rect: Rect);

    /// Intersects the clip with `rect` (relative to the current origin).
    fn clip_rect(&mut self, rect: Rect);

    /// Current drawing colour.
    fn color(&self) -> Color;

    /// Sets the drawing colour.
    fn set_color(&mut self, color: Color);

    /// Current font.
    fn font(&self) -> FontId;

    /// Sets the font.
    fn set_font(&mut self, font: FontId);

    /// Fills `rect` with the current colour, limited to the clip.
    fn fill_rect(&mut self, rect: Rect);

    /// Draws `image` into `area`, centred or tiled, limited to the clip.
    fn draw_image(&mut self, image: ImageId, area: Rect, tile: bool);
}

/// A saved translation, clip, colour and font.
///
/// The compositor captures one of these as the window baseline and restores
/// it after every layer, so a layer that leaves the surface in an odd state
/// cannot leak that state into the next layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceState {
    /// Origin offset.
    pub translation: (i32, i32),
    /// Clip relative to `translation`.
    pub clip: Rect,
    /// Drawing colour.
    pub color: Color,
    /// Font.
    pub font: FontId,
}

impl SurfaceState {
    /// Reads the current state of `surface`.
    #[must_use]
    pub fn capture(surface: &dyn Surface) -> Self {
        Self {
            translation: surface.translation(),
            clip: surface.clip(),
            color: surface.color(),
            font: surface.font(),
        }
    }

    /// Puts `surface` back into this state.
    pub fn restore(&self, surface: &mut dyn Surface) {
        let (tx, ty) = surface.translation();
        surface.translate(self.translation.0 - tx, self.translation.1 - ty);
        surface.set_clip(self.clip);
        surface.set_color(self.color);
        surface.set_font(self.font);
    }
}

/// A draw operation captured by [`RecordingSurface`].
///
/// Rectangles are absolute and already clipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOp {
    /// A solid fill.
    Fill {
        /// Covered area.
        rect: Rect,
        /// Fill colour.
        color: Color,
    },
    /// An image draw.
    Image {
        /// Which image.
        image: ImageId,
        /// Covered area.
        rect: Rect,
        /// Whether the image was tiled.
        tile: bool,
    },
}

impl DrawOp {
    /// Absolute area touched by the operation.
    #[must_use]
    pub fn rect(&self) -> Rect {
        match *self {
            Self::Fill { rect, .. } | Self::Image { rect, .. } => rect,
        }
    }
}

/// An in-memory [`Surface`] that records what was drawn.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    translation: (i32, i32),
    /// Clip in absolute coordinates.
    clip: Rect,
    color: Color,
    font: FontId,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    /// Creates a surface of the given size with the clip covering all of it.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            translation: (0, 0),
            clip: Rect::from_size(width, height),
            color: Color::BLACK,
            font: FontId::default(),
            ops: Vec::new(),
        }
    }

    /// Operations recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Returns and clears the recorded operations.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    fn to_absolute(&self, rect: Rect) -> Rect {
        rect.translate(self.translation.0, self.translation.1)
    }
}

impl Surface for RecordingSurface {
    fn translation(&self) -> (i32, i32) {
        self.translation
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.translation.0 += dx;
        self.translation.1 += dy;
    }

    fn clip(&self) -> Rect {
        self.clip.translate(-self.translation.0, -self.translation.1)
    }

    fn set_clip(&mut self, rect: Rect) {
        self.clip = self.to_absolute(rect);
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.clip = self.clip.intersect(&self.to_absolute(rect));
    }

    fn color(&self) -> Color {
        self.color
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn font(&self) -> FontId {
        self.font
    }

    fn set_font(&mut self, font: FontId) {
        self.font = font;
    }

    fn fill_rect(&mut self, rect: Rect) {
        let rect = self.to_absolute(rect).intersect(&self.clip);
        if !rect.is_empty() {
            self.ops.push(DrawOp::Fill {
                rect,
                color: self.color,
            });
        }
    }

    fn draw_image(&mut self, image: ImageId, area: Rect, tile: bool) {
        let rect = self.to_absolute(area).intersect(&self.clip);
        if !rect.is_empty() {
            self.ops.push(DrawOp::Image { image, rect, tile });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_translated_and_clipped() {
        let mut s = RecordingSurface::new(100, 100);
        s.translate(10, 20);
        s.clip_rect(Rect::new(0, 0, 5, 5));
        s.set_color(Color(0x12_34_56));
        s.fill_rect(Rect::new(-10, -10, 100, 100));
        assert_eq!(
            s.ops(),
            &[DrawOp::Fill {
                rect: Rect::new(10, 20, 5, 5),
                color: Color(0x12_34_56),
            }]
        );
    }

    #[test]
    fn clip_is_reported_relative_to_origin() {
        let mut s = RecordingSurface::new(50, 50);
        s.translate(10, 10);
        assert_eq!(s.clip(), Rect::new(-10, -10, 50, 50));
    }

    #[test]
    fn fully_clipped_draws_are_dropped() {
        let mut s = RecordingSurface::new(10, 10);
        s.fill_rect(Rect::new(20, 20, 5, 5));
        s.draw_image(ImageId(1), Rect::new(-8, 0, 4, 4), false);
        assert!(s.ops().is_empty(), "nothing visible was drawn");
    }

    #[test]
    fn state_round_trips() {
        let mut s = RecordingSurface::new(40, 40);
        s.translate(3, 4);
        s.set_clip(Rect::new(0, 0, 10, 10));
        let saved = SurfaceState::capture(&s);

        s.translate(7, 7);
        s.clip_rect(Rect::new(0, 0, 1, 1));
        s.set_color(Color::WHITE);
        s.set_font(FontId(9));

        saved.restore(&mut s);
        assert_eq!(SurfaceState::capture(&s), saved);
    }
}

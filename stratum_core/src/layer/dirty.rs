// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-rectangle dirty-region algebra.
//!
//! A layer tracks at most one dirty rectangle in its own local space. Adding
//! regions grows the rectangle to the bounding box of everything marked since
//! the layer was last clean; subtracting only succeeds when the result is
//! still a single rectangle. Both directions therefore over-approximate the
//! true dirty area, never under-approximate it.
//!
//! # Invariants
//!
//! - A [`Partial`](DirtyState::Partial) rectangle is never empty and always
//!   lies within `[0, 0, width, height]` of its layer.
//! - A partial rectangle never equals the full layer extent; that case is
//!   collapsed to [`Full`](DirtyState::Full).

use crate::geometry::Rect;

/// Dirty state of a single layer, in layer-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DirtyState {
    /// Nothing to repaint.
    #[default]
    Clean,
    /// Only this sub-rectangle needs repainting.
    Partial(Rect),
    /// The whole layer needs repainting.
    Full,
}

impl DirtyState {
    /// Returns `true` unless the state is [`Clean`](Self::Clean).
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        !matches!(self, Self::Clean)
    }

    /// Returns the literal dirty rectangle for a layer of the given size,
    /// expanding [`Full`](Self::Full) to the whole layer.
    #[must_use]
    pub fn resolve(&self, width: i32, height: i32) -> Option<Rect> {
        match *self {
            Self::Clean => None,
            Self::Partial(r) => Some(r),
            Self::Full => Some(Rect::from_size(width, height)),
        }
    }

    /// Grows the dirty area by `region`, clamped to the layer extent.
    ///
    /// Returns `true` if the state changed.
    pub(crate) fn add(&mut self, region: Rect, width: i32, height: i32) -> bool {
        if matches!(self, Self::Full) {
            return false;
        }
        let extent = Rect::from_size(width, height);
        let clamped = region.intersect(&extent);
        if clamped.is_empty() {
            return false;
        }
        let grown = match *self {
            Self::Partial(current) => current.bounding_union(&clamped),
            _ => clamped,
        };
        let next = if grown == extent {
            Self::Full
        } else {
            Self::Partial(grown)
        };
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    /// Removes `region` from the dirty area when the remainder is still one
    /// rectangle.
    ///
    /// Only a slab spanning the full height of the dirty rectangle (trimming
    /// its left or right side) or the full width (trimming top or bottom) can
    /// be removed. Anything else would need two rectangles and is declined.
    /// Returns `true` if the state changed.
    pub(crate) fn subtract(&mut self, region: Rect, width: i32, height: i32) -> bool {
        let Some(current) = self.resolve(width, height) else {
            return false;
        };
        if region.is_empty() || !region.intersects(&current) {
            return false;
        }

        let (mut dx, mut dy) = (current.x, current.y);
        let (mut dx2, mut dy2) = (current.right(), current.bottom());
        let (x, y, x2, y2) = (region.x, region.y, region.right(), region.bottom());

        let spans_height = y <= dy && y2 >= dy2;
        let spans_width = x <= dx && x2 >= dx2;
        if spans_height {
            if dx >= x && dx < x2 {
                dx = x2;
            } else if dx2 > x && dx2 <= x2 {
                dx2 = x;
            }
        } else if spans_width {
            if dy >= y && dy < y2 {
                dy = y2;
            } else if dy2 > y && dy2 <= y2 {
                dy2 = y;
            }
        } else {
            tracing::trace!(?current, ?region, "dirty subtraction is not rectangular");
            return false;
        }

        if dx >= dx2 || dy >= dy2 {
            *self = Self::Clean;
            return true;
        }
        let remaining = Rect::new(dx, dy, dx2 - dx, dy2 - dy);
        if remaining == current {
            return false;
        }
        *self = Self::Partial(remaining);
        true
    }
}

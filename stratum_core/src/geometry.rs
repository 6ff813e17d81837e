// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangle math for dirty-region tracking.
//!
//! All dirty-region bookkeeping in stratum uses axis-aligned integer
//! rectangles. A rectangle with a non-positive width or height is *empty*;
//! empty rectangles are legal values and simply cover no pixels.

use core::fmt;

/// An axis-aligned integer rectangle: origin plus extent.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from origin and extent.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at the origin with the given extent.
    #[inline]
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of covered pixels (zero for empty rectangles).
    #[must_use]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }

    /// Returns this rectangle's extent anchored at the origin.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Self {
        Self::from_size(self.width, self.height)
    }

    /// Intersection of two rectangles.
    ///
    /// Disjoint inputs produce an empty rectangle with zero extent.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x || y2 <= y {
            Self::new(x, y, 0, 0)
        } else {
            Self::new(x, y, x2 - x, y2 - y)
        }
    }

    /// Smallest rectangle containing both inputs.
    ///
    /// This is a bounding box, not an exact union: the result may cover
    /// pixels that neither input covers. An empty input is ignored.
    #[must_use]
    pub fn bounding_union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        Self::new(x, y, x2 - x, y2 - y)
    }

    /// Returns `true` if `other` lies entirely within `self`.
    #[must_use]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !(other.x >= self.right()
            || other.right() <= self.x
            || other.y >= self.bottom()
            || other.bottom() <= self.y)
    }

    /// Point hit-test, inclusive of the right and bottom edges.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Returns the rectangle moved by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Re-expresses this rectangle in the local space of a layer whose
    /// origin sits at `origin`.
    #[inline]
    #[must_use]
    pub const fn local_to(&self, origin: &Self) -> Self {
        self.translate(-origin.x, -origin.y)
    }

    /// Converts to a `kurbo` rectangle (`x0, y0, x1, y1` form).
    #[must_use]
    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Converts a `kurbo` rectangle, rounding outward so that the result
    /// covers every pixel the input touches.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "screen coordinates fit comfortably in i32"
    )]
    pub fn from_kurbo_outer(rect: kurbo::Rect) -> Self {
        let r = rect.abs().expand();
        let x = r.x0 as i32;
        let y = r.y0 as i32;
        Self::new(x, y, r.x1 as i32 - x, r.y1 as i32 - y)
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.x, self.y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Rect::new(5, 5, 5, 5));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 0, 5, 5);
        assert!(a.intersect(&b).is_empty(), "disjoint rects do not overlap");
        assert_eq!(a.intersect(&b).area(), 0);
    }

    #[test]
    fn bounding_union_covers_both() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(8, 8, 2, 2);
        let u = a.bounding_union(&b);
        assert_eq!(u, Rect::new(0, 0, 10, 10));
        assert!(u.contains_rect(&a) && u.contains_rect(&b), "bbox covers inputs");
    }

    #[test]
    fn bounding_union_ignores_empty() {
        let a = Rect::new(3, 3, 2, 2);
        assert_eq!(a.bounding_union(&Rect::ZERO), a);
        assert_eq!(Rect::new(50, 50, 0, 4).bounding_union(&a), a);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 5);
        let b = Rect::new(0, 5, 10, 5);
        assert!(!a.intersects(&b), "shared edge is not an overlap");
    }

    #[test]
    fn negative_extent_is_empty() {
        assert!(Rect::new(0, 0, -3, 4).is_empty());
        assert_eq!(Rect::new(0, 0, -3, 4).area(), 0);
    }

    #[test]
    fn point_hit_test_includes_far_edges() {
        let r = Rect::new(10, 10, 5, 5);
        assert!(r.contains_point(15, 15));
        assert!(!r.contains_point(16, 10));
    }

    #[test]
    fn kurbo_outer_rounds_outward() {
        let r = Rect::from_kurbo_outer(kurbo::Rect::new(0.5, 1.2, 9.1, 3.0));
        assert_eq!(r, Rect::new(0, 1, 10, 2));
        assert_eq!(Rect::new(1, 2, 3, 4).to_kurbo(), kurbo::Rect::new(1.0, 2.0, 4.0, 6.0));
    }
}

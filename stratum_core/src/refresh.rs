// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing queue of screen areas to blit after a paint pass.

use crate::geometry::Rect;

/// Absolute rectangles painted during one frame.
///
/// The paint pass records every layer clip here; the host drains the queue
/// once per frame and copies those areas to the physical display. Insertion
/// applies a cheap coalescing heuristic:
///
/// 1. a rectangle inside an already queued one (or equal to it) is dropped;
/// 2. queued rectangles inside the new one are dropped;
/// 3. a rectangle with the same `x` and `width` as a queued one that touches
///    it vertically is merged into it, and the merged band is queued again
///    under these same rules;
/// 4. anything else is appended.
///
/// No queued rectangle ever contains another. Overlapping rectangles that
/// fit none of these rules are queued separately, which over-blits but
/// never misses a pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshQueue {
    rects: Vec<Rect>,
}

impl RefreshQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `rect`, coalescing it with the existing entries. Empty
    /// rectangles are ignored.
    pub fn add(&mut self, mut rect: Rect) {
        if rect.is_empty() {
            return;
        }
        // Each merge removes one entry, so this terminates.
        loop {
            if self.rects.iter().any(|queued| queued.contains_rect(&rect)) {
                return;
            }
            self.rects.retain(|queued| !rect.contains_rect(queued));
            let Some(idx) = self.rects.iter().position(|queued| stacks_with(queued, &rect)) else {
                self.rects.push(rect);
                return;
            };
            let queued = self.rects.remove(idx);
            rect = Rect::new(
                rect.x,
                queued.y.min(rect.y),
                rect.width,
                queued.height + rect.height,
            );
        }
    }

    /// Queues the rectangle `(x, y, width, height)`.
    pub fn add_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.add(Rect::new(x, y, width, height));
    }

    /// Queued rectangles, in insertion order. A merged band counts as newly
    /// inserted.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Number of queued rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Smallest rectangle covering every queued one.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.bounding_union(&b))
    }

    /// Returns every queued rectangle and empties the queue.
    pub fn drain(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.rects)
    }
}

/// Same column, touching top to bottom.
fn stacks_with(a: &Rect, b: &Rect) -> bool {
    a.x == b.x && a.width == b.width && (a.bottom() == b.y || b.bottom() == a.y)
}

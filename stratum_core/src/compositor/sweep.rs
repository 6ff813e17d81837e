// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sweep-and-mark: occlusion pruning and dirty propagation.
//!
//! The pass walks the stack from the top down. At each layer `L`:
//!
//! 1. If `L` is visible and opaque, its area is subtracted from the dirty
//!    rectangle of every dirty layer below it.
//! 2. If `L` is dirty, its absolute dirty rectangle is added to every
//!    visible layer above it and, when `L` is translucent or hidden, to every
//!    visible layer below it. A hidden layer is cleaned afterwards.
//! 3. If step 2 changed a layer above `L`, the walk restarts from the highest
//!    such layer; otherwise it moves one layer down.
//!
//! Dirty rectangles only grow during propagation and subtraction never
//! re-dirties anything, so the restarts converge.

use super::WindowState;
use crate::geometry::Rect;
use crate::layer::{Layer, LayerId};
use crate::stack::EntryId;

/// Counters from one sweep-and-mark pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Layer visits, counting revisits after restarts.
    pub visited: u32,
    /// How many times the walk restarted from a higher layer.
    pub restarts: u32,
}

impl WindowState {
    pub(super) fn entry_layer(&self, entry: EntryId) -> Option<&Layer> {
        self.order.key(entry).and_then(|id| self.store.get(id))
    }

    /// Runs the full pass over the stack.
    pub(super) fn sweep_and_mark(&mut self) -> SweepStats {
        let mut stats = SweepStats::default();
        let mut current = self.order.top();

        while let Some(entry) = current {
            stats.visited += 1;
            let Some(layer) = self.entry_layer(entry) else {
                current = self.order.lower(entry);
                continue;
            };
            let visible = layer.is_visible();
            if visible && layer.is_opaque() {
                self.clean_lower_dirty_regions(entry);
            }

            // An invisible dirty layer was hidden since the last frame.
            if self.entry_layer(entry).is_some_and(Layer::is_dirty) {
                if let Some(changed) = self.propagate_dirty(entry, !visible) {
                    stats.restarts += 1;
                    tracing::trace!(
                        from = ?self.order.key(entry),
                        to = ?self.order.key(changed),
                        "sweep restarted"
                    );
                    current = Some(changed);
                    continue;
                }
            }
            current = self.order.lower(entry);
        }
        stats
    }

    /// Treats the whole of `id` as dirty and pushes that area to the rest of
    /// the stack, as if the layer had just been hidden.
    ///
    /// Returns the layer's stack entry, or `None` if it is not in the stack.
    pub(super) fn sweep_layer(&mut self, id: LayerId) -> Option<EntryId> {
        let entry = self.order.find(&id)?;
        self.store.get_mut(id)?.mark_dirty();
        self.propagate_dirty(entry, true);
        Some(entry)
    }

    /// Subtracts the area of `entry` from every dirty layer below it.
    fn clean_lower_dirty_regions(&mut self, entry: EntryId) {
        let Some(bounds) = self.entry_layer(entry).map(Layer::bounds) else {
            return;
        };
        let Self { store, order, .. } = self;
        for (_, lower) in order.below(entry) {
            if let Some(layer) = store.get_mut(lower) {
                if layer.is_dirty() {
                    layer.clear_region_dirty(bounds.local_to(&layer.bounds()));
                }
            }
        }
    }

    /// Adds the dirty area of `entry` to the layers that composite with it.
    ///
    /// Returns the highest layer above `entry` whose dirty state changed.
    fn propagate_dirty(&mut self, entry: EntryId, hidden: bool) -> Option<EntryId> {
        let id = self.order.key(entry)?;
        let layer = self.store.get(id)?;
        let area = absolute_dirty_area(layer);
        let opaque = layer.is_opaque();

        let Self { store, order, .. } = self;
        let mut highest = None;
        for (upper_entry, upper) in order.above(entry) {
            if let Some(layer) = store.get_mut(upper) {
                if layer.is_visible() && layer.mark_region_dirty(area.local_to(&layer.bounds())) {
                    // `above` walks nearest first, so the last hit is the highest.
                    highest = Some(upper_entry);
                }
            }
        }

        if !opaque || hidden {
            for (_, lower) in order.below(entry) {
                if let Some(layer) = store.get_mut(lower) {
                    if layer.is_visible() {
                        layer.mark_region_dirty(area.local_to(&layer.bounds()));
                    }
                }
            }
            if hidden {
                if let Some(layer) = store.get_mut(id) {
                    layer.clean();
                }
            }
        }
        highest
    }
}

/// Dirty area of `layer` in window coordinates; the whole layer if it is
/// clean.
fn absolute_dirty_area(layer: &Layer) -> Rect {
    let bounds = layer.bounds();
    layer
        .dirty_rect()
        .map_or(bounds, |dirty| dirty.translate(bounds.x, bounds.y))
}

#[cfg(test)]
mod tests {
    use crate::compositor::{Compositor, CompositorConfig};
    use crate::geometry::Rect;
    use crate::layer::{Background, DirtyState, Layer, LayerId};
    use crate::refresh::RefreshQueue;
    use crate::surface::{Color, RecordingSurface};

    fn window() -> Compositor {
        Compositor::new(
            CompositorConfig {
                width: 100,
                height: 100,
                background: Background::Color(Color::WHITE),
            },
            || {},
        )
    }

    fn attach(c: &Compositor, layer: Layer) -> LayerId {
        let id = c.create_layer(layer);
        assert!(c.add_layer(id), "fresh layer attaches");
        id
    }

    /// Paints one frame so every layer starts clean.
    fn settle(c: &Compositor) {
        let mut surface = RecordingSurface::new(100, 100);
        c.paint(&mut surface, &mut RefreshQueue::new());
    }

    fn dirty(c: &Compositor, id: LayerId) -> DirtyState {
        c.layer(id).map(|info| info.dirty).unwrap_or_default()
    }

    #[test]
    fn opaque_layer_prunes_covered_dirt_beneath() {
        let c = window();
        let below = attach(&c, Layer::new("below", Rect::new(0, 0, 100, 100)));
        let cover = attach(&c, Layer::new("cover", Rect::new(10, 10, 50, 50)));
        settle(&c);

        assert!(c.mark_region_dirty(below, Rect::new(20, 20, 10, 10)));
        c.sweep_and_mark();

        assert_eq!(dirty(&c, below), DirtyState::Clean, "hidden dirt pruned");
        assert_eq!(dirty(&c, cover), DirtyState::Clean);
    }

    #[test]
    fn dirt_propagates_into_translucent_layer_above() {
        let c = window();
        let below = attach(&c, Layer::new("below", Rect::new(0, 0, 100, 100)));
        let glass = attach(
            &c,
            Layer::new("glass", Rect::new(50, 50, 40, 40)).with_opaque(false),
        );
        settle(&c);

        c.mark_region_dirty(below, Rect::new(60, 60, 10, 10));
        let stats = c.sweep_and_mark();

        assert_eq!(
            dirty(&c, glass),
            DirtyState::Partial(Rect::new(10, 10, 10, 10)),
            "upper layer receives the translated rectangle"
        );
        assert_eq!(stats.restarts, 1, "walk restarts from the changed layer");
        assert_eq!(
            dirty(&c, c.background_layer()),
            DirtyState::Clean,
            "area pushed down by the translucent layer is pruned under `below`"
        );
    }

    #[test]
    fn translucent_layer_pushes_its_dirt_down() {
        let c = window();
        let glass = attach(
            &c,
            Layer::new("glass", Rect::new(50, 50, 40, 40)).with_opaque(false),
        );
        settle(&c);

        c.mark_region_dirty(glass, Rect::new(0, 0, 5, 5));
        let stats = c.sweep_and_mark();

        assert_eq!(
            dirty(&c, c.background_layer()),
            DirtyState::Partial(Rect::new(50, 50, 5, 5)),
            "uncovered layer beneath repaints behind the glass"
        );
        assert_eq!(dirty(&c, glass), DirtyState::Partial(Rect::new(0, 0, 5, 5)));
        assert_eq!(stats.restarts, 0, "nothing above the glass changed");
    }

    #[test]
    fn opaque_layer_keeps_its_dirt_to_itself() {
        let c = window();
        let tile = attach(&c, Layer::new("tile", Rect::new(50, 50, 40, 40)));
        settle(&c);

        c.mark_region_dirty(tile, Rect::new(0, 0, 5, 5));
        c.sweep_and_mark();

        assert_eq!(dirty(&c, c.background_layer()), DirtyState::Clean);
        assert_eq!(dirty(&c, tile), DirtyState::Partial(Rect::new(0, 0, 5, 5)));
    }

    #[test]
    fn partly_uncovered_dirt_reaches_opaque_layer_above() {
        let c = window();
        let below = attach(&c, Layer::new("below", Rect::new(0, 0, 100, 100)));
        let upper = attach(&c, Layer::new("upper", Rect::new(50, 50, 40, 40)));
        settle(&c);

        c.mark_region_dirty(below, Rect::new(40, 40, 20, 20));
        c.sweep_and_mark();

        assert_eq!(
            dirty(&c, below),
            DirtyState::Partial(Rect::new(40, 40, 20, 20)),
            "an L-shaped remainder is not representable, so the rectangle stays"
        );
        assert_eq!(dirty(&c, upper), DirtyState::Partial(Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn every_visible_layer_above_receives_the_area() {
        let c = window();
        let base = attach(&c, Layer::new("base", Rect::new(0, 0, 100, 100)));
        let mid = attach(
            &c,
            Layer::new("mid", Rect::new(0, 0, 100, 50)).with_opaque(false),
        );
        let hidden = attach(
            &c,
            Layer::new("hidden", Rect::new(0, 0, 100, 100)).with_visible(false),
        );
        let top = attach(
            &c,
            Layer::new("top", Rect::new(5, 5, 90, 90)).with_opaque(false),
        );
        settle(&c);

        c.mark_region_dirty(base, Rect::new(10, 10, 5, 5));
        c.sweep_and_mark();

        assert_eq!(dirty(&c, mid), DirtyState::Partial(Rect::new(10, 10, 5, 5)));
        assert_eq!(dirty(&c, top), DirtyState::Partial(Rect::new(5, 5, 5, 5)));
        assert_eq!(dirty(&c, hidden), DirtyState::Clean, "invisible layers are skipped");
    }

    #[test]
    fn removal_exposes_layer_beneath() {
        let c = window();
        let small = attach(&c, Layer::new("small", Rect::new(20, 20, 30, 30)));
        let cover = attach(&c, Layer::new("cover", Rect::new(0, 0, 100, 100)));
        settle(&c);

        assert!(c.remove_layer(cover));

        assert_eq!(dirty(&c, small), DirtyState::Full, "uncovered layer repaints");
        assert_eq!(dirty(&c, c.background_layer()), DirtyState::Full);
        assert_eq!(
            dirty(&c, cover),
            DirtyState::Clean,
            "removed layer discharged its dirt"
        );
    }

    #[test]
    fn hiding_a_layer_dirties_what_it_covered() {
        let c = window();
        let small = attach(&c, Layer::new("small", Rect::new(20, 20, 30, 30)));
        let cover = attach(&c, Layer::new("cover", Rect::new(0, 0, 50, 50)));
        settle(&c);

        assert!(c.set_visible(cover, false));
        let stats = c.sweep_and_mark();

        assert_eq!(dirty(&c, small), DirtyState::Full);
        assert_eq!(
            dirty(&c, c.background_layer()),
            DirtyState::Partial(Rect::new(0, 0, 50, 50))
        );
        assert_eq!(dirty(&c, cover), DirtyState::Clean, "hidden layer is cleaned");
        assert_eq!(stats.restarts, 0);
    }

    #[test]
    fn clean_stack_visits_each_layer_once() {
        let c = window();
        attach(&c, Layer::new("a", Rect::new(0, 0, 10, 10)));
        attach(&c, Layer::new("b", Rect::new(5, 5, 10, 10)));
        settle(&c);

        let stats = c.sweep_and_mark();
        assert_eq!(stats.visited, 3, "two layers plus the background");
        assert_eq!(stats.restarts, 0);
    }
}

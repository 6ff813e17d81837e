// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositor: one window's layer stack and its paint pipeline.
//!
//! A [`Compositor`] owns a [`LayerStore`] of layers and a [`LayerStack`] of
//! the attached ones, both behind a single lock. Layer mutation may happen on
//! any thread; [`Compositor::paint`] runs once per frame on the paint thread:
//!
//! ```text
//! paint()
//!   ├─ lock ── sweep_and_mark ── snapshot ── unlock
//!   └─ for each snapshot entry, bottom to top:
//!        translate, clip, queue refresh rect, paint, restore
//! ```
//!
//! Drawing happens without the lock, against the snapshot. Anything marked
//! dirty while a frame is being drawn is picked up by the next frame. A body
//! may add, remove or relocate layers while painting, its own included; a
//! notification for a body that is busy painting is delivered after the
//! paint loop.

mod notify;
mod paint;
mod sweep;

pub use sweep::SweepStats;

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use notify::{Notice, Notices};
use crate::geometry::Rect;
use crate::layer::{Background, DirtyState, Layer, LayerId, LayerStore, WindowId};
use crate::refresh::RefreshQueue;
use crate::stack::LayerStack;
use crate::surface::{Color, Surface, SurfaceState};
use crate::trace::{
    FrameSummaryBuilder, LayerPaintEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, SweepEvent,
    Timestamp, Tracer,
};

/// Window setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Window width in pixels.
    pub width: i32,
    /// Window height in pixels.
    pub height: i32,
    /// Background of the bottom-most layer.
    pub background: Background,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            background: Background::Color(Color::WHITE),
        }
    }
}

/// A point-in-time copy of a layer's attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerInfo {
    /// Diagnostic name.
    pub name: String,
    /// Position and size in window coordinates.
    pub bounds: Rect,
    /// Dirty state.
    pub dirty: DirtyState,
    /// Whether the layer is shown.
    pub visible: bool,
    /// Whether the layer fully covers its bounds.
    pub opaque: bool,
    /// Whether nothing is painted behind the body.
    pub transparent: bool,
    /// Whether the layer takes pointer input.
    pub supports_input: bool,
    /// The window the layer is attached to.
    pub owner: Option<WindowId>,
}

impl LayerInfo {
    fn of(layer: &Layer) -> Self {
        Self {
            name: layer.name().to_owned(),
            bounds: layer.bounds(),
            dirty: layer.dirty_state(),
            visible: layer.is_visible(),
            opaque: layer.is_opaque(),
            transparent: layer.is_transparent(),
            supports_input: layer.supports_input(),
            owner: layer.owner(),
        }
    }
}

/// A hit found by [`Compositor::layer_at`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerHit {
    /// The topmost input layer under the point.
    pub layer: LayerId,
    /// Point x in the layer's coordinates.
    pub x: i32,
    /// Point y in the layer's coordinates.
    pub y: i32,
}

/// What one call to [`Compositor::paint`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Zero-based frame counter.
    pub frame_index: u64,
    /// How many times sweep-and-mark restarted.
    pub sweep_restarts: u32,
    /// Layers painted.
    pub painted: u32,
    /// Layers whose body returned an error.
    pub failed: u32,
}

/// Stack state guarded by the compositor lock.
struct WindowState {
    store: LayerStore,
    order: LayerStack<LayerId>,
    width: i32,
    height: i32,
}

type RepaintHook = Box<dyn Fn() + Send + Sync>;

/// One window: a z-ordered stack of layers and the paint pipeline over it.
///
/// `Compositor` is `Send + Sync`; share it behind an `Arc` between the
/// threads that mutate layers and the thread that paints.
pub struct Compositor {
    id: WindowId,
    state: Mutex<WindowState>,
    dirty: AtomicBool,
    repaint: RepaintHook,
    notices: Notices,
    background: LayerId,
    frames: AtomicU64,
    epoch: Instant,
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("id", &self.id)
            .field("dirty", &self.dirty.load(Ordering::Relaxed))
            .field("background", &self.background)
            .field("frames", &self.frames.load(Ordering::Relaxed))
            .field("pending_notices", &self.notices.len())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Creates a window with an opaque background layer at the bottom.
    ///
    /// `repaint` is called whenever the window wants the host to schedule a
    /// [`paint`](Self::paint). It may run on any thread that mutates the
    /// window, never with the stack lock held.
    pub fn new(config: CompositorConfig, repaint: impl Fn() + Send + Sync + 'static) -> Self {
        let id = WindowId::next();
        let mut store = LayerStore::new(id);
        let mut background = Layer::new(
            "background",
            Rect::from_size(config.width, config.height),
        )
        .with_background(config.background);
        background.set_owner(Some(id));
        background.mark_dirty();
        let background = store.insert(background);

        let mut order = LayerStack::new();
        order.push_top(background);
        tracing::debug!(window = ?id, width = config.width, height = config.height, "window created");

        Self {
            id,
            state: Mutex::new(WindowState {
                store,
                order,
                width: config.width,
                height: config.height,
            }),
            dirty: AtomicBool::new(true),
            repaint: Box::new(repaint),
            notices: Notices::default(),
            background,
            frames: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// This window's identity, as recorded in attached layers.
    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The bottom-most layer created with the window.
    #[must_use]
    pub fn background_layer(&self) -> LayerId {
        self.background
    }

    // -- Layer lifecycle --

    /// Stores a detached layer and returns its handle.
    pub fn create_layer(&self, mut layer: Layer) -> LayerId {
        layer.set_owner(None);
        let name = layer.name().to_owned();
        let id = self.state.lock().store.insert(layer);
        tracing::debug!(window = ?self.id, layer = %name, ?id, "layer created");
        id
    }

    /// Destroys a layer, detaching it first if needed, and hands it back.
    ///
    /// Returns `None` for a stale handle or for the background layer.
    pub fn destroy_layer(&self, id: LayerId) -> Option<Layer> {
        if id == self.background {
            return None;
        }
        let (mut layer, detached) = {
            let mut state = self.state.lock();
            let detached = match state.sweep_layer(id) {
                Some(entry) => {
                    state.order.remove(entry);
                    true
                }
                None => false,
            };
            (state.store.remove(id)?, detached)
        };
        layer.set_owner(None);
        tracing::debug!(window = ?self.id, layer = %layer.name(), ?id, "layer destroyed");
        if detached {
            self.request_repaint();
            if let Some(content) = layer.content() {
                self.notices.send(content, Notice::Detached(self.id));
            }
        }
        Some(layer)
    }

    /// Attaches a layer on top of the stack and marks it fully dirty.
    ///
    /// Returns `false` if the layer is already attached or the handle is
    /// stale.
    pub fn add_layer(&self, id: LayerId) -> bool {
        let content = {
            let mut state = self.state.lock();
            let WindowState { store, order, .. } = &mut *state;
            let Some(layer) = store.get_mut(id) else {
                return false;
            };
            if order.find(&id).is_some() {
                return false;
            }
            layer.set_owner(Some(self.id));
            layer.mark_dirty();
            order.push_top(id);
            tracing::debug!(window = ?self.id, layer = %layer.name(), ?id, "layer added");
            layer.content().cloned()
        };
        self.request_repaint();
        if let Some(content) = content {
            self.notices.send(&content, Notice::Attached(self.id));
        }
        true
    }

    /// Detaches a layer, marking whatever it covered dirty.
    ///
    /// Returns `false` if the layer is not attached. The background layer
    /// cannot be removed.
    pub fn remove_layer(&self, id: LayerId) -> bool {
        if id == self.background {
            return false;
        }
        let content = {
            let mut state = self.state.lock();
            let Some(entry) = state.sweep_layer(id) else {
                return false;
            };
            let WindowState { store, order, .. } = &mut *state;
            order.remove(entry);
            let Some(layer) = store.get_mut(id) else {
                return false;
            };
            layer.set_owner(None);
            tracing::debug!(window = ?self.id, layer = %layer.name(), ?id, "layer removed");
            layer.content().cloned()
        };
        self.request_repaint();
        if let Some(content) = content {
            self.notices.send(&content, Notice::Detached(self.id));
        }
        true
    }

    /// Moves or resizes an attached layer.
    ///
    /// The old area is swept as if the layer had been removed, then the
    /// layer is marked fully dirty at its new position. Returns `false` if
    /// the layer is not attached or `bounds` equals its current bounds.
    pub fn relocate_layer(&self, id: LayerId, bounds: Rect) -> bool {
        let (content, old_bounds) = {
            let mut state = self.state.lock();
            let Some(old_bounds) = state.store.get(id).map(Layer::bounds) else {
                return false;
            };
            if old_bounds == bounds || state.sweep_layer(id).is_none() {
                return false;
            }
            let Some(layer) = state.store.get_mut(id) else {
                return false;
            };
            layer.set_bounds(bounds);
            layer.mark_dirty();
            tracing::debug!(
                window = ?self.id,
                layer = %layer.name(),
                from = ?old_bounds,
                to = ?bounds,
                "layer relocated"
            );
            (layer.content().cloned(), old_bounds)
        };
        self.request_repaint();
        if let Some(content) = content {
            self.notices.send(&content, Notice::Relocated(old_bounds));
        }
        true
    }

    // -- Per-layer state --

    /// Runs `f` on a layer under the stack lock and flags the window dirty
    /// when the layer is attached.
    ///
    /// The second value is `true` when the layer is attached and visible
    /// after `f` ran.
    fn update_layer<R>(&self, id: LayerId, f: impl FnOnce(&mut Layer) -> R) -> Option<(R, bool)> {
        let mut state = self.state.lock();
        let layer = state.store.get_mut(id)?;
        let result = f(layer);
        let owned = layer.owner().is_some();
        let shown = owned && layer.is_visible();
        drop(state);
        if owned {
            self.dirty.store(true, Ordering::Release);
        }
        Some((result, shown))
    }

    /// Marks a whole layer dirty. Returns `false` for a stale handle.
    pub fn mark_dirty(&self, id: LayerId) -> bool {
        self.update_layer(id, Layer::mark_dirty).is_some()
    }

    /// Adds `region` (layer-local) to a layer's dirty area.
    ///
    /// Returns `true` if the dirty area changed.
    pub fn mark_region_dirty(&self, id: LayerId, region: Rect) -> bool {
        self.update_layer(id, |layer| layer.mark_region_dirty(region))
            .is_some_and(|(changed, _)| changed)
    }

    /// Adds the pixels touched by `shape` (layer-local) to a layer's dirty
    /// area.
    ///
    /// Returns `true` if the dirty area changed.
    pub fn mark_shape_dirty(&self, id: LayerId, shape: &impl kurbo::Shape) -> bool {
        self.update_layer(id, |layer| layer.mark_shape_dirty(shape))
            .is_some_and(|(changed, _)| changed)
    }

    /// Removes `region` (layer-local) from a layer's dirty area.
    ///
    /// Returns `false` when nothing changed, including when the remainder
    /// would not be a single rectangle.
    pub fn clear_region_dirty(&self, id: LayerId, region: Rect) -> bool {
        self.update_layer(id, |layer| layer.clear_region_dirty(region))
            .is_some_and(|(changed, _)| changed)
    }

    /// Marks a whole layer dirty and, if it is attached and visible, asks the
    /// host for a repaint.
    pub fn request_layer_repaint(&self, id: LayerId) -> bool {
        let Some(((), shown)) = self.update_layer(id, Layer::mark_dirty) else {
            return false;
        };
        if shown {
            self.request_repaint();
        }
        true
    }

    /// Marks `region` (layer-local) dirty and, if the layer is attached and
    /// visible, asks the host for a repaint.
    pub fn request_region_repaint(&self, id: LayerId, region: Rect) -> bool {
        let Some((_, shown)) = self.update_layer(id, |layer| layer.mark_region_dirty(region)) else {
            return false;
        };
        if shown {
            self.request_repaint();
        }
        true
    }

    /// Shows or hides a layer. Returns `false` for a stale handle.
    pub fn set_visible(&self, id: LayerId, visible: bool) -> bool {
        self.update_layer(id, |layer| layer.set_visible(visible))
            .is_some()
    }

    /// Sets whether a layer fully covers its bounds.
    pub fn set_opaque(&self, id: LayerId, opaque: bool) -> bool {
        self.update_layer(id, |layer| layer.set_opaque(opaque))
            .is_some()
    }

    /// Replaces a layer's background.
    pub fn set_background(&self, id: LayerId, background: Background) -> bool {
        self.update_layer(id, |layer| layer.set_background(background))
            .is_some()
    }

    /// Sets whether a layer takes pointer input.
    pub fn set_supports_input(&self, id: LayerId, supports_input: bool) -> bool {
        self.update_layer(id, |layer| layer.set_supports_input(supports_input))
            .is_some()
    }

    // -- Queries --

    /// A copy of a layer's attributes, or `None` for a stale handle.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<LayerInfo> {
        self.state.lock().store.get(id).map(LayerInfo::of)
    }

    /// Returns `true` if the layer is in this window's stack.
    #[must_use]
    pub fn contains_layer(&self, id: LayerId) -> bool {
        self.state.lock().order.find(&id).is_some()
    }

    /// Attached layers from front to back.
    #[must_use]
    pub fn layers_top_down(&self) -> Vec<LayerId> {
        self.state
            .lock()
            .order
            .top_down()
            .map(|(_, id)| id)
            .collect()
    }

    /// Returns `true` if any visible layer above `id` overlaps it.
    #[must_use]
    pub fn is_overlapped(&self, id: LayerId) -> bool {
        let state = self.state.lock();
        let Some(entry) = state.order.find(&id) else {
            return false;
        };
        let Some(layer) = state.store.get(id) else {
            return false;
        };
        state
            .order
            .above(entry)
            .filter_map(|(_, upper)| state.store.get(upper))
            .any(|upper| upper.is_visible() && upper.intersects(layer))
    }

    /// The topmost visible, input-capable layer containing the window point
    /// `(x, y)`, with the point in that layer's coordinates.
    #[must_use]
    pub fn layer_at(&self, x: i32, y: i32) -> Option<LayerHit> {
        let state = self.state.lock();
        state.order.top_down().find_map(|(_, id)| {
            let layer = state.store.get(id)?;
            if !layer.supports_input() || !layer.contains_point(x, y) {
                return None;
            }
            let bounds = layer.bounds();
            Some(LayerHit {
                layer: id,
                x: x - bounds.x,
                y: y - bounds.y,
            })
        })
    }

    /// Returns `true` if something changed since the last frame started.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Window area, at the origin.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let state = self.state.lock();
        Rect::from_size(state.width, state.height)
    }

    /// Number of frames painted so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    // -- Window-wide --

    /// Marks every visible attached layer fully dirty.
    pub fn set_all_dirty(&self) {
        {
            let mut state = self.state.lock();
            let WindowState { store, order, .. } = &mut *state;
            for (_, id) in order.bottom_up() {
                if let Some(layer) = store.get_mut(id) {
                    if layer.is_visible() {
                        layer.mark_dirty();
                    }
                }
            }
        }
        self.dirty.store(true, Ordering::Release);
    }

    /// Changes the window size and stretches the background layer to match.
    ///
    /// Returns `false` if the size did not change.
    pub fn resize(&self, width: i32, height: i32) -> bool {
        {
            let mut state = self.state.lock();
            if (state.width, state.height) == (width, height) {
                return false;
            }
            state.width = width;
            state.height = height;
        }
        tracing::debug!(window = ?self.id, width, height, "window resized");
        self.relocate_layer(self.background, Rect::from_size(width, height));
        true
    }

    /// Flags the window dirty and asks the host to schedule a paint.
    pub fn request_repaint(&self) {
        self.dirty.store(true, Ordering::Release);
        (self.repaint)();
    }

    // -- Frame passes --

    /// Runs occlusion pruning and dirty propagation without painting.
    pub fn sweep_and_mark(&self) -> SweepStats {
        self.state.lock().sweep_and_mark()
    }

    /// Paints one frame into `surface`, queueing the painted areas on
    /// `refresh`.
    ///
    /// The surface's translation, clip, colour and font are the same
    /// afterwards as before.
    pub fn paint(&self, surface: &mut dyn Surface, refresh: &mut RefreshQueue) -> FrameReport {
        self.paint_traced(surface, refresh, &mut Tracer::none())
    }

    /// [`paint`](Self::paint) with frame instrumentation.
    pub fn paint_traced(
        &self,
        surface: &mut dyn Surface,
        refresh: &mut RefreshQueue,
        tracer: &mut Tracer<'_>,
    ) -> FrameReport {
        // Marks from here on flag the next frame.
        self.dirty.store(false, Ordering::Release);
        let frame_index = self.frames.fetch_add(1, Ordering::Relaxed);
        let mut summary = FrameSummaryBuilder::new(frame_index, self.now());
        let original = SurfaceState::capture(surface);

        let (frame, stats, extent) = {
            let mut state = self.state.lock();
            self.begin_phase(tracer, &mut summary, frame_index, PhaseKind::Sweep);
            let stats = state.sweep_and_mark();
            self.end_phase(tracer, &mut summary, frame_index, PhaseKind::Sweep);
            tracer.sweep(&SweepEvent {
                frame_index,
                visited: stats.visited,
                restarts: stats.restarts,
            });
            summary.set_restarts(stats.restarts);

            self.begin_phase(tracer, &mut summary, frame_index, PhaseKind::Snapshot);
            let frame = state.snapshot();
            self.end_phase(tracer, &mut summary, frame_index, PhaseKind::Snapshot);
            (frame, stats, Rect::from_size(state.width, state.height))
        };

        surface.set_clip(extent);
        let baseline = SurfaceState::capture(surface);
        let mut report = FrameReport {
            frame_index,
            sweep_restarts: stats.restarts,
            ..FrameReport::default()
        };

        self.begin_phase(tracer, &mut summary, frame_index, PhaseKind::Paint);
        for entry in &frame {
            let outcome = paint::paint_entry(entry, surface, &baseline, refresh);
            report.painted += 1;
            if outcome.failed {
                report.failed += 1;
            }
            summary.layer_painted(outcome.failed);
            tracer.layer_paint(&LayerPaintEvent {
                frame_index,
                layer: entry.layer,
                area: outcome.area,
                failed: outcome.failed,
            });
        }
        self.end_phase(tracer, &mut summary, frame_index, PhaseKind::Paint);

        original.restore(surface);
        self.notices.flush();

        #[cfg(feature = "trace-rich")]
        tracer.refresh_rects(frame_index, refresh.rects());
        tracer.frame_summary(&summary.finish());

        tracing::trace!(
            window = ?self.id,
            frame_index,
            painted = report.painted,
            failed = report.failed,
            restarts = report.sweep_restarts,
            "frame painted"
        );
        report
    }

    fn now(&self) -> Timestamp {
        Timestamp(u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }

    fn begin_phase(
        &self,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
    ) {
        let timestamp = self.now();
        summary.phase_begin(phase, timestamp);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase,
            timestamp,
        });
    }

    fn end_phase(
        &self,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
    ) {
        let timestamp = self.now();
        summary.phase_end(phase, timestamp);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase,
            timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::PaintResult;
    use crate::layer::LayerContent;

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

    fn settle(c: &Compositor) {
        let mut surface = crate::surface::RecordingSurface::new(100, 100);
        c.paint(&mut surface, &mut RefreshQueue::new());
    }

    #[derive(Default)]
    struct Hooks {
        attached: Vec<WindowId>,
        detached: Vec<WindowId>,
        relocated: Vec<Rect>,
    }

    struct Watched(Arc<Mutex<Hooks>>);

    impl LayerContent for Watched {
        fn paint_body(&mut self, _surface: &mut dyn Surface, _size: Rect) -> PaintResult {
            Ok(())
        }

        fn attached(&mut self, window: WindowId) {
            self.0.lock().attached.push(window);
        }

        fn detached(&mut self, window: WindowId) {
            self.0.lock().detached.push(window);
        }

        fn relocated(&mut self, old_bounds: Rect) {
            self.0.lock().relocated.push(old_bounds);
        }
    }

    #[test]
    fn new_window_has_dirty_background() {
        let c = window();
        let bg = c.background_layer();
        assert_eq!(c.layers_top_down(), vec![bg]);
        let info = c.layer(bg).unwrap();
        assert_eq!(info.bounds, Rect::new(0, 0, 100, 100));
        assert_eq!(info.dirty, DirtyState::Full);
        assert_eq!(info.owner, Some(c.id()));
        assert!(!info.transparent);
        assert!(c.is_dirty());
    }

    #[test]
    fn add_layer_goes_on_top_and_rejects_duplicates() {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let c = Compositor::new(CompositorConfig::default(), move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let a = c.create_layer(Layer::new("a", Rect::new(0, 0, 10, 10)));
        let b = c.create_layer(Layer::new("b", Rect::new(0, 0, 10, 10)));
        assert!(!c.contains_layer(a), "created layers start detached");

        assert!(c.add_layer(a));
        assert!(c.add_layer(b));
        assert!(!c.add_layer(a), "second add is rejected");

        assert_eq!(c.layers_top_down(), vec![b, a, c.background_layer()]);
        assert_eq!(c.layer(a).unwrap().owner, Some(c.id()));
        assert_eq!(c.layer(a).unwrap().dirty, DirtyState::Full);
        assert_eq!(requests.load(Ordering::Relaxed), 2, "one repaint per add");
    }

    #[test]
    fn lifecycle_hooks_fire_once_each() {
        let c = window();
        let hooks = Arc::new(Mutex::new(Hooks::default()));
        let id = c.create_layer(
            Layer::new("watched", Rect::new(0, 0, 10, 10)).with_content(Watched(Arc::clone(&hooks))),
        );

        assert!(c.add_layer(id));
        assert!(c.relocate_layer(id, Rect::new(5, 5, 10, 10)));
        assert!(c.remove_layer(id));
        assert!(!c.remove_layer(id), "second remove is rejected");

        let hooks = hooks.lock();
        assert_eq!(hooks.attached, vec![c.id()]);
        assert_eq!(hooks.relocated, vec![Rect::new(0, 0, 10, 10)]);
        assert_eq!(hooks.detached, vec![c.id()]);
    }

    #[test]
    fn relocate_to_same_bounds_is_noop() {
        let c = window();
        let id = c.create_layer(Layer::new("l", Rect::new(10, 10, 20, 20)));
        assert!(!c.relocate_layer(id, Rect::new(0, 0, 5, 5)), "detached layers are rejected");
        c.add_layer(id);
        settle(&c);

        assert!(!c.relocate_layer(id, Rect::new(10, 10, 20, 20)));
        assert_eq!(c.layer(id).unwrap().dirty, DirtyState::Clean);
    }

    #[test]
    fn relocate_dirties_old_and_new_areas() {
        let c = window();
        let id = c.create_layer(Layer::new("l", Rect::new(10, 10, 20, 20)));
        c.add_layer(id);
        settle(&c);

        assert!(c.relocate_layer(id, Rect::new(50, 50, 20, 20)));

        let info = c.layer(id).unwrap();
        assert_eq!(info.bounds, Rect::new(50, 50, 20, 20));
        assert_eq!(info.dirty, DirtyState::Full);
        assert_eq!(
            c.layer(c.background_layer()).unwrap().dirty,
            DirtyState::Partial(Rect::new(10, 10, 20, 20)),
            "the vacated area is repainted"
        );
    }

    #[test]
    fn background_layer_cannot_be_removed_or_destroyed() {
        let c = window();
        let bg = c.background_layer();
        assert!(!c.remove_layer(bg));
        assert!(c.destroy_layer(bg).is_none());
        assert!(c.contains_layer(bg));
    }

    #[test]
    fn destroy_detaches_and_invalidates_handle() {
        let c = window();
        let hooks = Arc::new(Mutex::new(Hooks::default()));
        let id = c.create_layer(
            Layer::new("doomed", Rect::new(0, 0, 10, 10)).with_content(Watched(Arc::clone(&hooks))),
        );
        c.add_layer(id);

        let layer = c.destroy_layer(id).expect("live handle");
        assert_eq!(layer.name(), "doomed");
        assert_eq!(layer.owner(), None);
        assert!(c.layer(id).is_none(), "handle is stale after destroy");
        assert!(!c.mark_dirty(id));
        assert!(c.destroy_layer(id).is_none());
        assert_eq!(hooks.lock().detached, vec![c.id()]);
    }

    #[test]
    fn stale_handles_are_rejected_everywhere() {
        let c = window();
        let id = c.create_layer(Layer::new("gone", Rect::new(0, 0, 10, 10)));
        c.destroy_layer(id);
        let reused = c.create_layer(Layer::new("new", Rect::new(0, 0, 10, 10)));

        assert!(!c.add_layer(id));
        assert!(!c.set_visible(id, false));
        assert!(!c.request_layer_repaint(id));
        assert!(!c.is_overlapped(id));
        assert_eq!(c.layer(reused).map(|info| info.name), Some("new".to_owned()));
    }

    #[test]
    fn handles_from_another_window_are_rejected() {
        let a = window();
        let b = window();
        let in_a = a.create_layer(Layer::new("a", Rect::new(0, 0, 10, 10)));
        let in_b = b.create_layer(Layer::new("b", Rect::new(0, 0, 10, 10)));
        assert_eq!(
            (in_a.index(), in_a.generation()),
            (in_b.index(), in_b.generation()),
            "same slot in both stores"
        );
        assert_eq!(in_a.window(), a.id());

        assert!(b.layer(in_a).is_none());
        assert!(!b.add_layer(in_a));
        assert!(!b.mark_dirty(in_a));
        assert!(b.destroy_layer(in_a).is_none());
        assert_eq!(b.layer(in_b).map(|info| info.name), Some("b".to_owned()));
        assert_eq!(a.layer(in_a).map(|info| info.name), Some("a".to_owned()));
    }

    #[test]
    fn shape_marks_reach_the_refresh_queue() {
        let c = window();
        let id = c.create_layer(Layer::new("vector", Rect::new(20, 20, 40, 40)));
        c.add_layer(id);
        settle(&c);

        let stroke = kurbo::Line::new((2.5, 3.0), (10.2, 7.5));
        assert!(c.mark_shape_dirty(id, &stroke));
        assert!(!c.mark_shape_dirty(id, &stroke), "same pixels again");
        assert_eq!(
            c.layer(id).unwrap().dirty,
            DirtyState::Partial(Rect::new(2, 3, 9, 5))
        );

        let mut surface = crate::surface::RecordingSurface::new(100, 100);
        let mut refresh = RefreshQueue::new();
        c.paint(&mut surface, &mut refresh);
        assert_eq!(refresh.drain(), vec![Rect::new(22, 23, 9, 5)]);
    }

    #[test]
    fn marking_is_idempotent() {
        let c = window();
        let id = c.create_layer(Layer::new("l", Rect::new(0, 0, 50, 50)));
        assert!(c.mark_region_dirty(id, Rect::new(1, 1, 5, 5)));
        assert!(!c.mark_region_dirty(id, Rect::new(1, 1, 5, 5)), "second mark is no change");
        assert!(c.clear_region_dirty(id, Rect::new(0, 0, 50, 50)));
        assert_eq!(c.layer(id).unwrap().dirty, DirtyState::Clean);
    }

    #[test]
    fn layer_repaint_only_schedules_for_visible_attached_layers() {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let c = Compositor::new(CompositorConfig::default(), move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let id = c.create_layer(Layer::new("l", Rect::new(0, 0, 10, 10)));

        assert!(c.request_layer_repaint(id));
        assert_eq!(requests.load(Ordering::Relaxed), 0, "detached layer");

        c.add_layer(id);
        let after_add = requests.load(Ordering::Relaxed);
        assert!(c.request_region_repaint(id, Rect::new(0, 0, 2, 2)));
        assert_eq!(requests.load(Ordering::Relaxed), after_add + 1);

        c.set_visible(id, false);
        assert!(c.request_layer_repaint(id));
        assert_eq!(requests.load(Ordering::Relaxed), after_add + 1, "hidden layer");
    }

    #[test]
    fn is_overlapped_considers_visible_layers_above() {
        let c = window();
        let low = c.create_layer(Layer::new("low", Rect::new(0, 0, 20, 20)));
        let high = c.create_layer(Layer::new("high", Rect::new(10, 10, 20, 20)));
        let far = c.create_layer(Layer::new("far", Rect::new(60, 60, 10, 10)));
        for id in [low, high, far] {
            c.add_layer(id);
        }

        assert!(c.is_overlapped(low));
        assert!(!c.is_overlapped(high));
        assert!(c.is_overlapped(c.background_layer()));

        c.set_visible(high, false);
        assert!(!c.is_overlapped(low), "hidden layers do not overlap");
    }

    #[test]
    fn layer_at_finds_topmost_input_layer() {
        let c = window();
        let under = c.create_layer(Layer::new("under", Rect::new(0, 0, 50, 50)).with_input(true));
        let over = c.create_layer(Layer::new("over", Rect::new(20, 20, 50, 50)).with_input(true));
        let inert = c.create_layer(Layer::new("inert", Rect::new(0, 0, 100, 100)));
        for id in [under, over, inert] {
            c.add_layer(id);
        }

        assert_eq!(
            c.layer_at(25, 30),
            Some(LayerHit { layer: over, x: 5, y: 10 }),
            "layers without input are skipped"
        );
        assert_eq!(c.layer_at(5, 5), Some(LayerHit { layer: under, x: 5, y: 5 }));
        assert_eq!(c.layer_at(90, 90), None);

        c.set_supports_input(over, false);
        assert_eq!(c.layer_at(25, 30).map(|hit| hit.layer), Some(under));
    }

    #[test]
    fn set_all_dirty_skips_hidden_layers() {
        let c = window();
        let shown = c.create_layer(Layer::new("shown", Rect::new(0, 0, 10, 10)));
        let hidden = c.create_layer(Layer::new("hidden", Rect::new(0, 0, 10, 10)));
        c.add_layer(shown);
        c.add_layer(hidden);
        c.set_visible(hidden, false);
        settle(&c);
        assert!(!c.is_dirty());

        c.set_all_dirty();

        assert!(c.is_dirty());
        assert_eq!(c.layer(shown).unwrap().dirty, DirtyState::Full);
        assert_eq!(c.layer(hidden).unwrap().dirty, DirtyState::Clean);
        assert_eq!(c.layer(c.background_layer()).unwrap().dirty, DirtyState::Full);
    }

    #[test]
    fn resize_stretches_background() {
        let c = window();
        settle(&c);

        assert!(c.resize(200, 150));
        assert!(!c.resize(200, 150), "same size is a no-op");

        assert_eq!(c.bounds(), Rect::new(0, 0, 200, 150));
        let bg = c.layer(c.background_layer()).unwrap();
        assert_eq!(bg.bounds, Rect::new(0, 0, 200, 150));
        assert_eq!(bg.dirty, DirtyState::Full);
    }

    #[test]
    fn frame_counter_advances() {
        let c = window();
        let first = {
            let mut surface = crate::surface::RecordingSurface::new(100, 100);
            c.paint(&mut surface, &mut RefreshQueue::new())
        };
        settle(&c);
        assert_eq!(first.frame_index, 0);
        assert_eq!(c.frame_count(), 2);
    }

    #[test]
    fn compositor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compositor>();
    }

    #[test]
    fn concurrent_marks_are_not_lost() {
        let c = Arc::new(window());
        let id = c.create_layer(Layer::new("l", Rect::new(0, 0, 100, 100)));
        c.add_layer(id);
        settle(&c);

        let marker = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                for i in 0..50 {
                    c.mark_region_dirty(id, Rect::new(i, i, 1, 1));
                }
            })
        };
        let mut surface = crate::surface::RecordingSurface::new(100, 100);
        let mut refresh = RefreshQueue::new();
        for _ in 0..5 {
            c.paint(&mut surface, &mut refresh);
        }
        marker.join().unwrap();
        c.paint(&mut surface, &mut refresh);

        let covered = refresh.bounding_box().unwrap();
        assert!(
            covered.contains_rect(&Rect::new(0, 0, 50, 50)),
            "every mark was painted in some frame, got {covered:?}"
        );
        assert_eq!(c.layer(id).unwrap().dirty, DirtyState::Clean);
    }
}

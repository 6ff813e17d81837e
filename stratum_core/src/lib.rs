// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered, dirty-region screen compositing.
//!
//! `stratum_core` keeps a window's layers in a z-ordered stack, tracks one
//! dirty rectangle per layer, and repaints only what changed. Layers live in
//! an index-based arena addressed by generational handles, so stale handles
//! are detected instead of aliasing a newer layer.
//!
//! # Architecture
//!
//! A frame turns the dirty state accumulated since the last frame into draw
//! calls and a list of screen areas to blit:
//!
//! ```text
//!   mark_dirty / add / remove / relocate   (any thread, stack lock)
//!       │
//!       ▼
//!   Compositor::paint()
//!       ├─ sweep_and_mark ── occlusion pruning + propagation   (locked)
//!       ├─ snapshot ──────── copy + clean visible dirty layers  (locked)
//!       └─ paint loop ────── Surface draws + RefreshQueue       (unlocked)
//!                                                   │
//!                                                   ▼
//!                                     host drains RefreshQueue, blits
//! ```
//!
//! **[`geometry`]**: integer [`Rect`](geometry::Rect) with `kurbo` interop.
//!
//! **[`layer`]**: the [`Layer`](layer::Layer) record, its dirty-rectangle
//! algebra, the [`LayerContent`](layer::LayerContent) paint callback and the
//! generational [`LayerStore`](layer::LayerStore).
//!
//! **[`stack`]**: index-linked [`LayerStack`](stack::LayerStack) giving the
//! z-order.
//!
//! **[`compositor`]**: the [`Compositor`](compositor::Compositor), which owns
//! one stack and runs the paint pipeline.
//!
//! **[`surface`]**: the [`Surface`](surface::Surface) drawing capability and
//! an in-memory [`RecordingSurface`](surface::RecordingSurface).
//!
//! **[`refresh`]**: the coalescing [`RefreshQueue`](refresh::RefreshQueue).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! **[`error`]**: [`PaintError`](error::PaintError), returned by layer
//! bodies.
//!
//! # Logging
//!
//! Structural changes are logged at `debug`, dirty-state changes and sweep
//! restarts at `trace`, and failed layer paints at `warn`, all through the
//! `tracing` crate. Install a subscriber to see them.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates the per-frame
//!   refresh rectangle event.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod compositor;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod refresh;
pub mod stack;
pub mod surface;
pub mod trace;

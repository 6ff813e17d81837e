// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame instrumentation for the paint pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! compositor calls at each stage of a frame. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Free-form diagnostics (structural changes, paint failures) go through the
//! `tracing` crate instead; this module only carries structured per-frame
//! events.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates the per-frame refresh rectangle
//!   event.

use core::fmt;

use crate::geometry::Rect;
use crate::layer::LayerId;

// ---------------------------------------------------------------------------
// Time and phases
// ---------------------------------------------------------------------------

/// Nanoseconds since the emitting compositor was created.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Nanoseconds elapsed from `earlier` to `self`, or zero if `earlier` is
    /// later.
    #[must_use]
    pub const fn saturating_nanos_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ns)", self.0)
    }
}

/// Which phase of a frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Occlusion pruning and dirty propagation (stack locked).
    Sweep,
    /// Copying dirty layers into the frame list (stack locked).
    Snapshot,
    /// Drawing the copied layers (stack unlocked).
    Paint,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Time at the start of the phase.
    pub timestamp: Timestamp,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Time at the end of the phase.
    pub timestamp: Timestamp,
}

/// Emitted after the sweep-and-mark pass converged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Layer visits, counting revisits after restarts.
    pub visited: u32,
    /// How many times the pass restarted from a higher layer.
    pub restarts: u32,
}

/// Emitted once per painted layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPaintEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The painted layer.
    pub layer: LayerId,
    /// Painted area in window coordinates.
    pub area: Rect,
    /// Whether the layer body reported an error.
    pub failed: bool,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Time the frame started.
    pub started: Timestamp,
    /// Sweep phase duration in nanoseconds (0 if not measured).
    pub sweep_nanos: u64,
    /// Snapshot phase duration in nanoseconds (0 if not measured).
    pub snapshot_nanos: u64,
    /// Paint phase duration in nanoseconds (0 if not measured).
    pub paint_nanos: u64,
    /// Sweep restarts.
    pub restarts: u32,
    /// Layers painted.
    pub painted: u32,
    /// Layers whose body failed.
    pub failed: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the paint pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a frame phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after sweep-and-mark.
    fn on_sweep(&mut self, e: &SweepEvent) {
        _ = e;
    }

    /// Called after each layer was painted.
    fn on_layer_paint(&mut self, e: &LayerPaintEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the frame's coalesced refresh rectangles (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_refresh_rects(&mut self, frame_index: u64, rects: &[Rect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SweepEvent`].
    #[inline]
    pub fn sweep(&mut self, e: &SweepEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sweep(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayerPaintEvent`].
    #[inline]
    pub fn layer_paint(&mut self, e: &LayerPaintEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_paint(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits refresh rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn refresh_rects(&mut self, frame_index: u64, rects: &[Rect]) {
        if let Some(s) = &mut self.sink {
            s.on_refresh_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    started: Timestamp,
    phase_starts: [Option<Timestamp>; 3],
    phase_ends: [Option<Timestamp>; 3],
    restarts: u32,
    painted: u32,
    failed: u32,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(frame_index: u64, started: Timestamp) -> Self {
        Self {
            frame_index,
            started,
            phase_starts: [None; 3],
            phase_ends: [None; 3],
            restarts: 0,
            painted: 0,
            failed: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: Timestamp) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: Timestamp) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records the sweep restart count.
    pub fn set_restarts(&mut self, restarts: u32) {
        self.restarts = restarts;
    }

    /// Counts one painted layer.
    pub fn layer_painted(&mut self, failed: bool) {
        self.painted += 1;
        if failed {
            self.failed += 1;
        }
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            started: self.started,
            sweep_nanos: self.phase_duration(PhaseKind::Sweep),
            snapshot_nanos: self.phase_duration(PhaseKind::Snapshot),
            paint_nanos: self.phase_duration(PhaseKind::Paint),
            restarts: self.restarts,
            painted: self.painted,
            failed: self.failed,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_nanos_since(start),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Sweep => 0,
        PhaseKind::Snapshot => 1,
        PhaseKind::Paint => 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

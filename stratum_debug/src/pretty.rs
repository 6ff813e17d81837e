// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds since the compositor was created.

use std::io::Write;

use stratum_core::geometry::Rect;
use stratum_core::trace::{
    FrameSummary, LayerPaintEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, SweepEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Sweep => "sweep",
        PhaseKind::Snapshot => "snapshot",
        PhaseKind::Paint => "paint",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            nanos_to_us(e.timestamp.0),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            nanos_to_us(e.timestamp.0),
        );
    }

    fn on_sweep(&mut self, e: &SweepEvent) {
        let _ = writeln!(
            self.writer,
            "[sweep] frame={} visited={} restarts={}",
            e.frame_index, e.visited, e.restarts,
        );
    }

    fn on_layer_paint(&mut self, e: &LayerPaintEvent) {
        let status = if e.failed { "FAILED" } else { "ok" };
        let _ = writeln!(
            self.writer,
            "[layer] frame={} {:?} area={} {status}",
            e.frame_index, e.layer, e.area,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} sweep={:.1}µs snapshot={:.1}µs paint={:.1}µs \
             restarts={} painted={} failed={}",
            s.frame_index,
            nanos_to_us(s.sweep_nanos),
            nanos_to_us(s.snapshot_nanos),
            nanos_to_us(s.paint_nanos),
            s.restarts,
            s.painted,
            s.failed,
        );
    }

    fn on_refresh_rects(&mut self, frame_index: u64, rects: &[Rect]) {
        let _ = writeln!(
            self.writer,
            "[refresh] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}

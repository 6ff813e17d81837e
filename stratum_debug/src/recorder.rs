// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! [`on_refresh_rects`](TraceSink::on_refresh_rects) stores only the count
//! and the bounding box of the rectangles.

use stratum_core::geometry::Rect;
use stratum_core::trace::{
    FrameSummary, LayerPaintEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, SweepEvent,
    Timestamp, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_SWEEP: u8 = 3;
const TAG_LAYER_PAINT: u8 = 4;
const TAG_FRAME_SUMMARY: u8 = 5;
const TAG_REFRESH_RECTS: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_rect(&mut self, r: Rect) {
        for v in [r.x, r.y, r.width, r.height] {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Sweep => 0,
            PhaseKind::Snapshot => 1,
            PhaseKind::Paint => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.0);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.0);
    }

    fn on_sweep(&mut self, e: &SweepEvent) {
        self.write_u8(TAG_SWEEP);
        self.write_u64(e.frame_index);
        self.write_u32(e.visited);
        self.write_u32(e.restarts);
    }

    fn on_layer_paint(&mut self, e: &LayerPaintEvent) {
        self.write_u8(TAG_LAYER_PAINT);
        self.write_u64(e.frame_index);
        self.write_u32(e.layer.index());
        self.write_u32(e.layer.generation());
        self.write_rect(e.area);
        self.write_u8(u8::from(e.failed));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.started.0);
        self.write_u64(s.sweep_nanos);
        self.write_u64(s.snapshot_nanos);
        self.write_u64(s.paint_nanos);
        self.write_u32(s.restarts);
        self.write_u32(s.painted);
        self.write_u32(s.failed);
    }

    fn on_refresh_rects(&mut self, frame_index: u64, rects: &[Rect]) {
        self.write_u8(TAG_REFRESH_RECTS);
        self.write_u64(frame_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "refresh rect count capped at u32::MAX for recording"
        )]
        self.write_u32(rects.len().min(u32::MAX as usize) as u32);
        let bounds = rects
            .iter()
            .copied()
            .reduce(|a, b| a.bounding_union(&b))
            .unwrap_or(Rect::ZERO);
        self.write_rect(bounds);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded layer paint record.
///
/// Layer handles cannot be rebuilt outside the compositor, so the raw slot
/// index and generation are kept instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedLayerPaint {
    /// Frame counter.
    pub frame_index: u64,
    /// Slot index of the layer handle.
    pub layer_index: u32,
    /// Generation of the layer handle.
    pub layer_generation: u32,
    /// Painted area in window coordinates.
    pub area: Rect,
    /// Whether the layer body failed.
    pub failed: bool,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`SweepEvent`].
    Sweep(SweepEvent),
    /// A layer paint outcome.
    LayerPaint(RecordedLayerPaint),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Refresh rectangles queued in a frame.
    RefreshRects {
        /// Frame counter.
        frame_index: u64,
        /// Number of queued rectangles.
        count: u32,
        /// Bounding box of the queued rectangles.
        bounds: Rect,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_rect(&mut self) -> Option<Rect> {
        Some(Rect::new(
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
        ))
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Sweep,
            1 => PhaseKind::Snapshot,
            _ => PhaseKind::Paint,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: Timestamp(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: Timestamp(self.read_u64()?),
        }))
    }

    fn decode_sweep(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Sweep(SweepEvent {
            frame_index: self.read_u64()?,
            visited: self.read_u32()?,
            restarts: self.read_u32()?,
        }))
    }

    fn decode_layer_paint(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayerPaint(RecordedLayerPaint {
            frame_index: self.read_u64()?,
            layer_index: self.read_u32()?,
            layer_generation: self.read_u32()?,
            area: self.read_rect()?,
            failed: self.read_u8()? != 0,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            started: Timestamp(self.read_u64()?),
            sweep_nanos: self.read_u64()?,
            snapshot_nanos: self.read_u64()?,
            paint_nanos: self.read_u64()?,
            restarts: self.read_u32()?,
            painted: self.read_u32()?,
            failed: self.read_u32()?,
        }))
    }

    fn decode_refresh_rects(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        let bounds = self.read_rect()?;
        Some(RecordedEvent::RefreshRects {
            frame_index,
            count,
            bounds,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_SWEEP => self.decode_sweep(),
            TAG_LAYER_PAINT => self.decode_layer_paint(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_REFRESH_RECTS => self.decode_refresh_rects(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::compositor::{Compositor, CompositorConfig};
    use stratum_core::layer::Layer;
    use stratum_core::refresh::RefreshQueue;
    use stratum_core::surface::RecordingSurface;
    use stratum_core::trace::Tracer;

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            started: Timestamp(1_000_000),
            sweep_nanos: 400,
            snapshot_nanos: 50,
            paint_nanos: 2_000,
            restarts: 1,
            painted: 3,
            failed: 1,
        }
    }

    #[test]
    fn phase_events_keep_order_and_fields() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 5,
            phase: PhaseKind::Paint,
            timestamp: Timestamp(2000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 5,
            phase: PhaseKind::Paint,
            timestamp: Timestamp(3000),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::PhaseBegin(e) => {
                assert_eq!(e.frame_index, 5);
                assert_eq!(e.phase, PhaseKind::Paint);
                assert_eq!(e.timestamp, Timestamp(2000));
            }
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::PhaseEnd(e) => assert_eq!(e.timestamp, Timestamp(3000)),
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
    }

    #[test]
    fn frame_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::FrameSummary(s)] => assert_eq!(*s, sample_summary()),
            other => panic!("expected one FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn refresh_rects_store_count_and_bounds() {
        let mut rec = RecorderSink::new();
        rec.on_refresh_rects(42, &[Rect::new(0, 0, 10, 10), Rect::new(20, 5, 5, 20)]);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [
                RecordedEvent::RefreshRects {
                    frame_index,
                    count,
                    bounds,
                },
            ] => {
                assert_eq!(*frame_index, 42);
                assert_eq!(*count, 2);
                assert_eq!(*bounds, Rect::new(0, 0, 25, 25));
            }
            other => panic!("expected RefreshRects, got {other:?}"),
        }
    }

    #[test]
    fn truncated_buffer_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_sweep(&SweepEvent {
            frame_index: 1,
            visited: 4,
            restarts: 0,
        });
        rec.on_frame_summary(&sample_summary());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1, "partial trailing record is dropped");
        assert!(matches!(events[0], RecordedEvent::Sweep(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn records_a_real_frame() {
        let window = Compositor::new(CompositorConfig::default(), || {});
        let id = window.create_layer(Layer::new("panel", Rect::new(0, 0, 10, 10)));
        window.add_layer(id);

        let mut rec = RecorderSink::new();
        let mut surface = RecordingSurface::new(240, 320);
        window.paint_traced(&mut surface, &mut RefreshQueue::new(), &mut Tracer::new(&mut rec));

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        let paints: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::LayerPaint(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(paints.len(), 2, "background and panel");
        assert_eq!(paints[1].layer_index, id.index());
        assert_eq!(paints[1].area, Rect::new(0, 0, 10, 10));
        assert!(matches!(events[0], RecordedEvent::PhaseBegin(_)));
        assert!(matches!(events.last(), Some(RecordedEvent::FrameSummary(s)) if s.painted == 2));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, RecordedEvent::RefreshRects { count: 1, .. })),
            "panel area coalesces into the background area"
        );
    }
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use stratum_core::geometry::Rect;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Phases become duration slices. Per-layer and per-frame records carry no
/// timestamp of their own and are placed at the start of the enclosing phase.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Timestamp of the latest phase boundary, in microseconds.
    let mut cursor = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                cursor = nanos_to_us(e.timestamp.0);
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": cursor,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                cursor = nanos_to_us(e.timestamp.0);
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": cursor,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Sweep(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Sweep",
                    "cat": "Frame",
                    "ts": cursor,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "visited": e.visited,
                        "restarts": e.restarts,
                    }
                }));
            }
            RecordedEvent::LayerPaint(p) => {
                let name = if p.failed {
                    "LayerPaintFailed"
                } else {
                    "LayerPaint"
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Layer",
                    "ts": cursor,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": p.frame_index,
                        "layer": p.layer_index,
                        "generation": p.layer_generation,
                        "area": rect_json(p.area),
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": nanos_to_us(s.started.0),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "sweep_us": nanos_to_us(s.sweep_nanos),
                        "snapshot_us": nanos_to_us(s.snapshot_nanos),
                        "paint_us": nanos_to_us(s.paint_nanos),
                        "restarts": s.restarts,
                        "painted": s.painted,
                        "failed": s.failed,
                    }
                }));
            }
            RecordedEvent::RefreshRects {
                frame_index,
                count,
                bounds,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "RefreshRects",
                    "cat": "Rich",
                    "ts": cursor,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                        "bounds": rect_json(bounds),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

fn rect_json(r: Rect) -> Value {
    json!([r.x, r.y, r.width, r.height])
}

// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame snapshot and the unlocked paint loop.

use super::WindowState;
use crate::geometry::Rect;
use crate::layer::{Background, DirtyCopy, LayerId, SharedContent, paint_layer};
use crate::refresh::RefreshQueue;
use crate::surface::{Surface, SurfaceState};

/// Everything needed to paint one layer, copied out under the stack lock.
pub(super) struct FrameEntry {
    pub(super) layer: LayerId,
    pub(super) name: String,
    pub(super) copy: DirtyCopy,
    pub(super) background: Background,
    pub(super) content: Option<SharedContent>,
}

/// Result of painting one [`FrameEntry`].
#[derive(Clone, Copy, Debug)]
pub(super) struct PaintOutcome {
    /// Painted area in window coordinates.
    pub(super) area: Rect,
    pub(super) failed: bool,
}

impl WindowState {
    /// Copies every visible dirty layer, bottom to top, and cleans it.
    ///
    /// Marks made after this point belong to the next frame.
    pub(super) fn snapshot(&mut self) -> Vec<FrameEntry> {
        let Self { store, order, .. } = self;
        order
            .bottom_up()
            .filter_map(|(_, id)| {
                let layer = store.get_mut(id)?;
                if !layer.is_visible() {
                    return None;
                }
                let copy = layer.snapshot_and_clear()?;
                Some(FrameEntry {
                    layer: id,
                    name: layer.name().to_owned(),
                    copy,
                    background: layer.background(),
                    content: layer.content().cloned(),
                })
            })
            .collect()
    }
}

/// Paints one layer and puts `surface` back to `baseline`.
///
/// A failing body is logged and reported, never propagated.
pub(super) fn paint_entry(
    entry: &FrameEntry,
    surface: &mut dyn Surface,
    baseline: &SurfaceState,
    refresh: &mut RefreshQueue,
) -> PaintOutcome {
    let DirtyCopy { bounds, dirty } = entry.copy;
    surface.translate(bounds.x, bounds.y);
    surface.clip_rect(dirty);

    let area = dirty.translate(bounds.x, bounds.y);
    refresh.add(area);

    let result = paint_layer(
        surface,
        &entry.background,
        entry.content.as_ref(),
        bounds.size(),
    );
    baseline.restore(surface);

    if let Err(err) = &result {
        tracing::warn!(layer = %entry.name, id = ?entry.layer, ?area, error = %err, "layer paint failed");
    }
    PaintOutcome {
        area,
        failed: result.is_err(),
    }
}

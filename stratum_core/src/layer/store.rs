// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot storage for layers with generational handles.

use super::id::{LayerId, WindowId};
use super::node::Layer;

/// Slot arena holding every layer a compositor knows about, attached or not.
///
/// Destroyed layers are recycled via a free list, and generation counters
/// make stale handles resolve to nothing instead of to a newer layer.
/// Handles issued for another window resolve to nothing as well.
#[derive(Debug)]
pub struct LayerStore {
    window: WindowId,
    slots: Vec<Option<Layer>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl LayerStore {
    /// Creates an empty store issuing handles for `window`.
    #[must_use]
    pub fn new(window: WindowId) -> Self {
        Self {
            window,
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// The window stamped into every handle this store issues.
    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Stores `layer` and returns its handle.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "layer counts stay far below u32::MAX"
    )]
    pub fn insert(&mut self, layer: Layer) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped on removal.
            self.slots[idx as usize] = Some(layer);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(layer));
            self.generation.push(0);
            idx
        };
        LayerId {
            window: self.window,
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Removes a layer, freeing its slot for reuse.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        if !self.is_alive(id) {
            return None;
        }
        let layer = self.slots[id.idx as usize].take();
        // Bump generation so old handles immediately fail validation.
        self.generation[id.idx as usize] += 1;
        self.free_list.push(id.idx);
        layer
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        id.window == self.window
            && (id.idx as usize) < self.slots.len()
            && self.generation[id.idx as usize] == id.generation
            && self.slots[id.idx as usize].is_some()
    }

    /// Shared access to a live layer.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        if id.window != self.window
            || self.generation.get(id.idx as usize) != Some(&id.generation)
        {
            return None;
        }
        self.slots[id.idx as usize].as_ref()
    }

    /// Exclusive access to a live layer.
    #[must_use]
    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        if id.window != self.window
            || self.generation.get(id.idx as usize) != Some(&id.generation)
        {
            return None;
        }
        self.slots[id.idx as usize].as_mut()
    }

    /// Number of live layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns `true` if no layers are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

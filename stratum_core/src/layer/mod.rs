// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer data model.
//!
//! A *layer* is a rectangle in a window's z-ordered stack. Each layer has:
//!
//! - An identity ([`LayerId`]), a generational handle that becomes stale when
//!   the layer is destroyed, so a recycled slot is never mistaken for the
//!   layer that used to live there.
//! - Geometry: `bounds` in window coordinates.
//! - Flags: `visible`, `opaque` (fully covers its bounds when painted),
//!   `supports_input`, and a [`Background`] (none means transparent).
//! - A [`DirtyState`]: clean, one partial rectangle, or the whole layer.
//! - An optional body ([`LayerContent`]) that paints the layer and receives
//!   attach, detach and relocate notifications.
//! - An owner: the [`WindowId`] of the window whose stack holds it, if any.
//!
//! # Dirty tracking
//!
//! Dirty state is a single axis-aligned rectangle, never a set. Marking grows
//! it to a bounding box; clearing only succeeds for slabs that leave one
//! rectangle behind. See [`DirtyState`] for the exact rules.

mod content;
mod dirty;
mod id;
mod node;
mod store;

pub use content::{Background, LayerContent, SharedContent};
pub(crate) use content::paint_layer;
pub use dirty::DirtyState;
pub use id::{INVALID, LayerId, WindowId};
pub use node::{DirtyCopy, Layer};
pub use store::LayerStore;

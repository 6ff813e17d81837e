// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delivery of attach, detach and relocate notifications to layer bodies.
//!
//! A body is locked for as long as it paints. When a notification targets a
//! body that is busy (typically a body removing its own layer from inside
//! `paint_body`), it is parked here and delivered once the paint pass is
//! over, so no compositor call ever waits on a body lock.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::geometry::Rect;
use crate::layer::{LayerContent, SharedContent, WindowId};

/// One lifecycle notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Notice {
    Attached(WindowId),
    Detached(WindowId),
    Relocated(Rect),
}

impl Notice {
    fn deliver(self, body: &mut dyn LayerContent) {
        match self {
            Self::Attached(window) => body.attached(window),
            Self::Detached(window) => body.detached(window),
            Self::Relocated(old_bounds) => body.relocated(old_bounds),
        }
    }
}

/// Notifications waiting for their body to become free.
#[derive(Default)]
pub(super) struct Notices {
    pending: Mutex<Vec<(SharedContent, Notice)>>,
}

impl Notices {
    /// Delivers `notice` now if `content` is free, otherwise parks it.
    ///
    /// A body with notifications already parked gets this one parked behind
    /// them, so each body sees its notifications in order.
    pub(super) fn send(&self, content: &SharedContent, notice: Notice) {
        let mut pending = self.pending.lock();
        if !pending.iter().any(|(parked, _)| Arc::ptr_eq(parked, content)) {
            if let Some(mut body) = content.try_lock() {
                drop(pending);
                notice.deliver(&mut *body);
                return;
            }
        }
        tracing::debug!(?notice, "layer body busy, notification deferred");
        pending.push((Arc::clone(content), notice));
    }

    /// Delivers everything parked so far.
    ///
    /// Must be called without any body lock held. Notifications parked by
    /// the hooks run here wait for the next call.
    pub(super) fn flush(&self) {
        let parked = core::mem::take(&mut *self.pending.lock());
        for (content, notice) in parked {
            notice.deliver(&mut *content.lock());
        }
    }

    /// Number of parked notifications.
    pub(super) fn len(&self) -> usize {
        self.pending.lock().len()
    }
}

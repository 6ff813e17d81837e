// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types surfaced by layer paint callbacks.

/// Convenience result type for [`LayerContent::paint_body`].
///
/// [`LayerContent::paint_body`]: crate::layer::LayerContent::paint_body
pub type PaintResult = Result<(), PaintError>;

/// Failure reported by a layer while painting its body.
///
/// The compositor logs these and carries on with the remaining layers; a
/// failing layer never blanks the rest of the frame.
#[derive(thiserror::Error, Debug)]
pub enum PaintError {
    /// The layer could not draw its content.
    #[error("paint failed: {0}")]
    Failed(String),

    /// A resource the layer draws from (image, glyph cache, ...) is missing.
    #[error("missing paint resource: {0}")]
    MissingResource(String),

    /// Wrapped lower-level error from the layer's own dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PaintError {
    /// Build a [`PaintError::Failed`] value.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Build a [`PaintError::MissingResource`] value.
    pub fn missing_resource(msg: impl Into<String>) -> Self {
        Self::MissingResource(msg.into())
    }
}

//! Error types for the particle portrait core.

use thiserror::Error;

/// Errors produced while configuring, sampling, or animating a portrait.
#[derive(Debug, Error)]
pub enum PortraitError {
    /// Width or height was zero (or their product overflowed) for a raster or viewport.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A particle field was requested with zero particles.
    #[error("invalid particle count: at least one particle is required")]
    InvalidParticleCount,

    /// A configuration value was outside its accepted range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A pixel buffer did not match the declared raster size.
    #[error("buffer length mismatch: expected {expected} bytes, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The image contained no pixel with alpha above the visibility threshold.
    #[error("image has no visible pixels to sample")]
    NoVisiblePixels,

    /// The source image could not be fetched or decoded.
    #[error("image load failed: {0}")]
    ImageLoad(String),

    /// A host element the portrait attaches to was not found.
    #[error("missing anchor element: {0}")]
    MissingAnchor(String),

    /// A viewport with a non-positive or non-finite size was supplied.
    #[error("invalid viewport: width and height must be positive and finite")]
    InvalidViewport,

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl PortraitError {
    /// Shorthand for [`PortraitError::InvalidParameter`].
    pub fn invalid_param(name: &str, reason: impl Into<String>) -> Self {
        PortraitError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

//! PNG output of a splatted frame.
//!
//! Feature-gated behind `codecs` so that WASM builds can depend on this
//! crate for [`crate::pixel`] without pulling in the `image` crate.

use std::path::Path;

use portrait_core::camera::Camera;
use portrait_core::error::PortraitError;
use portrait_core::particles::ParticleField;

use crate::pixel::{splat_rgba, Frame};

/// Writes an already splatted frame as PNG.
pub fn write_frame(frame: Frame, path: &Path) -> Result<(), PortraitError> {
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
        .ok_or_else(|| PortraitError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| PortraitError::Io(e.to_string()))
}

/// Renders the field through `camera` and writes the result as PNG.
pub fn write_png(
    field: &ParticleField,
    camera: &Camera,
    glow_intensity: f32,
    path: &Path,
) -> Result<(), PortraitError> {
    write_frame(splat_rgba(field, camera, glow_intensity), path)
}

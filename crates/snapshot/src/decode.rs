//! Decoding the portrait image into a sampling raster.
//!
//! Feature-gated behind `codecs` together with PNG output. The image is
//! stretched to exactly the configured sampling size, the way a browser
//! `drawImage(img, 0, 0, w, h)` call onto an offscreen canvas would.

use std::path::Path;

use image::imageops::FilterType;
use log::debug;
use portrait_core::error::PortraitError;
use portrait_core::raster::Raster;

/// Resamples decoded image data to `width x height` RGBA8.
pub fn raster_from_image(
    img: &image::DynamicImage,
    width: usize,
    height: usize,
) -> Result<Raster, PortraitError> {
    let w = u32::try_from(width).map_err(|_| PortraitError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| PortraitError::InvalidDimensions)?;
    if w == 0 || h == 0 {
        return Err(PortraitError::InvalidDimensions);
    }
    let resized = img.resize_exact(w, h, FilterType::Triangle).to_rgba8();
    Raster::from_rgba(width, height, resized.into_raw())
}

/// Decodes an in-memory image (any enabled format) into a raster.
pub fn decode_raster(bytes: &[u8], width: usize, height: usize) -> Result<Raster, PortraitError> {
    let img =
        image::load_from_memory(bytes).map_err(|e| PortraitError::ImageLoad(e.to_string()))?;
    raster_from_image(&img, width, height)
}

/// Opens and decodes the image at `path` into a raster.
///
/// Missing files and undecodable data both map to
/// `PortraitError::ImageLoad`, which callers answer with the fallback sphere.
pub fn load_raster(path: &Path, width: usize, height: usize) -> Result<Raster, PortraitError> {
    let img = image::open(path)
        .map_err(|e| PortraitError::ImageLoad(format!("{}: {e}", path.display())))?;
    debug!(
        "decoded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    raster_from_image(&img, width, height)
}

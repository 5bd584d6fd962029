#![deny(unsafe_code)]
//! Host-side I/O for the particle portrait: decoding the source image into
//! a sampling raster, CPU splatting of the particle field, and PNG output.
//!
//! The CLI depends on this crate for offline rendering; the splatter in
//! [`pixel`] is codec-free and always available.

pub mod pixel;

#[cfg(feature = "codecs")]
pub mod decode;
#[cfg(feature = "codecs")]
pub mod snapshot;

pub use pixel::{splat_rgba, Frame};

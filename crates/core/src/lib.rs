#![deny(unsafe_code)]
//! Core of the particle portrait effect.
//!
//! An image is sampled into a brightness-weighted point cloud
//! ([`sampler`]), each point starts scattered on a spherical shell and
//! eases toward its image position as scroll progress goes from 0 to 1
//! ([`particles`], [`scroll`], [`animator`]). [`PortraitScene`] bundles the
//! pieces into one host-owned context.

pub mod animator;
pub mod camera;
pub mod config;
pub mod error;
pub mod params;
pub mod particles;
pub mod prng;
pub mod raster;
pub mod sampler;
pub mod scene;
pub mod scroll;
pub mod sprite;

#[cfg(feature = "render")]
pub mod render;

pub use animator::{ease_out_cubic, Animator, FramePacing};
pub use camera::{Camera, Viewport};
pub use config::PortraitConfig;
pub use error::PortraitError;
pub use particles::{Particle, ParticleField, TargetSource};
pub use prng::{RandomSource, Xorshift64};
pub use raster::Raster;
pub use sampler::{sample, PixelSample};
pub use scene::PortraitScene;
pub use scroll::{ScrollTracker, SectionBounds};

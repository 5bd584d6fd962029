//! Tunable parameters of a particle portrait.
//!
//! A [`PortraitConfig`] together with the source image fully determines the
//! particle cloud: the same config and pixels always produce bit-identical
//! buffers.

use crate::error::PortraitError;
use crate::params::{param_f32, param_u64, param_usize};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_PARTICLE_COUNT: usize = 15_000;
pub const DEFAULT_PARTICLE_SIZE: f32 = 2.0;
pub const DEFAULT_IMAGE_WIDTH: usize = 400;
pub const DEFAULT_IMAGE_HEIGHT: usize = 400;
/// Side length of the square the sampled image occupies in world units.
pub const DEFAULT_SAMPLE_SCALE: f32 = 6.0;
pub const DEFAULT_SCATTER_RADIUS: f32 = 8.0;
pub const DEFAULT_FALLBACK_RADIUS: f32 = 3.0;
pub const DEFAULT_GLOW_INTENSITY: f32 = 1.5;
pub const DEFAULT_SEED: u64 = 42;

/// Parameters for sampling, scattering, and drawing the particle cloud.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortraitConfig {
    /// Number of particles; fixed for the lifetime of a field.
    pub particle_count: usize,
    /// Base point size before the per-particle jitter.
    pub particle_size: f32,
    /// Width the source image is resampled to before sampling.
    pub image_width: usize,
    /// Height the source image is resampled to before sampling.
    pub image_height: usize,
    pub sample_scale: f32,
    /// Outer radius of the shell the scattered positions are drawn from.
    pub scatter_radius: f32,
    /// Radius of the sphere used as target when the image is unavailable.
    pub fallback_radius: f32,
    pub glow_intensity: f32,
    pub seed: u64,
}

impl Default for PortraitConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            particle_size: DEFAULT_PARTICLE_SIZE,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            sample_scale: DEFAULT_SAMPLE_SCALE,
            scatter_radius: DEFAULT_SCATTER_RADIUS,
            fallback_radius: DEFAULT_FALLBACK_RADIUS,
            glow_intensity: DEFAULT_GLOW_INTENSITY,
            seed: DEFAULT_SEED,
        }
    }
}

impl PortraitConfig {
    /// Builds a config from a JSON object, using defaults for missing keys.
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    pub fn from_json(params: &Value) -> Self {
        Self {
            particle_count: param_usize(params, "particle_count", DEFAULT_PARTICLE_COUNT),
            particle_size: param_f32(params, "particle_size", DEFAULT_PARTICLE_SIZE),
            image_width: param_usize(params, "image_width", DEFAULT_IMAGE_WIDTH),
            image_height: param_usize(params, "image_height", DEFAULT_IMAGE_HEIGHT),
            sample_scale: param_f32(params, "sample_scale", DEFAULT_SAMPLE_SCALE),
            scatter_radius: param_f32(params, "scatter_radius", DEFAULT_SCATTER_RADIUS),
            fallback_radius: param_f32(params, "fallback_radius", DEFAULT_FALLBACK_RADIUS),
            glow_intensity: param_f32(params, "glow_intensity", DEFAULT_GLOW_INTENSITY),
            seed: param_u64(params, "seed", DEFAULT_SEED),
        }
    }

    /// Current values as a JSON object with the same keys `from_json` reads.
    pub fn to_json(&self) -> Value {
        json!({
            "particle_count": self.particle_count,
            "particle_size": self.particle_size,
            "image_width": self.image_width,
            "image_height": self.image_height,
            "sample_scale": self.sample_scale,
            "scatter_radius": self.scatter_radius,
            "fallback_radius": self.fallback_radius,
            "glow_intensity": self.glow_intensity,
            "seed": self.seed,
        })
    }

    /// Checks counts, dimensions, and radii.
    pub fn validate(&self) -> Result<(), PortraitError> {
        if self.particle_count == 0 {
            return Err(PortraitError::InvalidParticleCount);
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(PortraitError::InvalidDimensions);
        }
        self.image_width
            .checked_mul(self.image_height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(PortraitError::InvalidDimensions)?;

        let positive = [
            ("particle_size", self.particle_size),
            ("sample_scale", self.sample_scale),
            ("scatter_radius", self.scatter_radius),
            ("fallback_radius", self.fallback_radius),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PortraitError::invalid_param(
                    name,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }
        if !self.glow_intensity.is_finite() || self.glow_intensity < 0.0 {
            return Err(PortraitError::invalid_param(
                "glow_intensity",
                format!("must be non-negative and finite, got {}", self.glow_intensity),
            ));
        }
        Ok(())
    }

    /// Schema describing every parameter: type, default, range, description.
    pub fn param_schema() -> Value {
        json!({
            "particle_count": {
                "type": "integer",
                "default": DEFAULT_PARTICLE_COUNT,
                "min": 1,
                "max": 200_000,
                "description": "Number of particles in the cloud"
            },
            "particle_size": {
                "type": "number",
                "default": DEFAULT_PARTICLE_SIZE,
                "min": 0.1,
                "max": 16.0,
                "description": "Base point size, jittered per particle by 0.5-1.0x"
            },
            "image_width": {
                "type": "integer",
                "default": DEFAULT_IMAGE_WIDTH,
                "min": 1,
                "max": 4096,
                "description": "Width the image is resampled to before sampling"
            },
            "image_height": {
                "type": "integer",
                "default": DEFAULT_IMAGE_HEIGHT,
                "min": 1,
                "max": 4096,
                "description": "Height the image is resampled to before sampling"
            },
            "sample_scale": {
                "type": "number",
                "default": DEFAULT_SAMPLE_SCALE,
                "min": 0.1,
                "max": 100.0,
                "description": "World-space size of the assembled image"
            },
            "scatter_radius": {
                "type": "number",
                "default": DEFAULT_SCATTER_RADIUS,
                "min": 0.1,
                "max": 100.0,
                "description": "Outer radius of the scatter shell"
            },
            "fallback_radius": {
                "type": "number",
                "default": DEFAULT_FALLBACK_RADIUS,
                "min": 0.1,
                "max": 100.0,
                "description": "Sphere radius used when the image cannot be loaded"
            },
            "glow_intensity": {
                "type": "number",
                "default": DEFAULT_GLOW_INTENSITY,
                "min": 0.0,
                "max": 10.0,
                "description": "Color multiplier applied by the point shader"
            },
            "seed": {
                "type": "integer",
                "default": DEFAULT_SEED,
                "description": "PRNG seed for sampling and scatter"
            }
        })
    }
}

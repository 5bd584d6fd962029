//! CPU splatting of a [`ParticleField`] into an RGBA8 buffer.
//!
//! Mirrors the point shader: each particle becomes a round sprite with
//! quadratic alpha falloff, its color scaled by the glow intensity and
//! added onto a black background. This module needs no codec, so it is
//! always available.

use portrait_core::camera::Camera;
use portrait_core::particles::ParticleField;
use portrait_core::sprite::{sprite_alpha, sprite_diameter};

/// Sprites smaller than this (in device pixels) are drawn at this size.
const MIN_DIAMETER: f32 = 1.0;

/// An RGBA8 frame with its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Renders the field as seen through `camera` at the drawing-buffer size.
pub fn splat_rgba(field: &ParticleField, camera: &Camera, glow_intensity: f32) -> Frame {
    let viewport = camera.viewport();
    let (width, height) = viewport.drawing_buffer_size();
    let (w, h) = (width as usize, height as usize);
    let scale = width as f32 / viewport.width;
    let model = field.model_matrix();

    let mut accum = vec![0.0_f32; w * h * 3];
    for p in field.particles() {
        let Some(centre) = camera.project(model, p.current) else {
            continue;
        };
        let depth = camera.depth(model, p.current);
        let diameter = (sprite_diameter(p.size, depth) * scale).max(MIN_DIAMETER);
        let (cx, cy) = (centre.x * scale, centre.y * scale);
        let radius = diameter / 2.0;

        let x0 = (cx - radius).floor().max(0.0) as usize;
        let y0 = (cy - radius).floor().max(0.0) as usize;
        let x1 = ((cx + radius).ceil().max(0.0) as usize).min(w);
        let y1 = ((cy + radius).ceil().max(0.0) as usize).min(h);
        let color = p.color * glow_intensity;

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() / diameter;
                if let Some(alpha) = sprite_alpha(d) {
                    let i = (y * w + x) * 3;
                    accum[i] += color.x * alpha;
                    accum[i + 1] += color.y * alpha;
                    accum[i + 2] += color.z * alpha;
                }
            }
        }
    }

    let rgba = accum
        .chunks_exact(3)
        .flat_map(|c| {
            let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            [to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), 255u8]
        })
        .collect();
    Frame {
        width,
        height,
        rgba,
    }
}

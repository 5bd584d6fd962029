//! Brightness-weighted image sampling.
//!
//! Turns a [`Raster`] into exactly `target_count` [`PixelSample`]s:
//!
//! 1. every visible pixel (alpha > 128) is accepted with probability
//!    `brightness / 255`, and unconditionally while the pool holds fewer
//!    than half the target, so dark images still produce a usable pool;
//! 2. the pool is thinned by a fixed stride `max(1, pool / target)`;
//! 3. any shortfall is padded by drawing pool entries with replacement.
//!
//! Grid coordinates map into a centred square of side `scale` with the y
//! axis flipped, so row 0 ends up at the top of the assembled image.

use glam::Vec3;
use log::debug;

use crate::error::PortraitError;
use crate::prng::RandomSource;
use crate::raster::{Raster, VISIBLE_ALPHA};

/// One sampled pixel: world position (z = 0) and linear color in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub position: Vec3,
    pub color: Vec3,
}

impl PixelSample {
    /// Builds a sample from grid coordinates and RGB bytes.
    pub fn from_pixel(
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        rgb: [u8; 3],
        scale: f32,
    ) -> Self {
        let u = x as f32 / width as f32;
        let v = y as f32 / height as f32;
        Self {
            position: Vec3::new((u - 0.5) * scale, -(v - 0.5) * scale, 0.0),
            color: Vec3::new(
                rgb[0] as f32 / 255.0,
                rgb[1] as f32 / 255.0,
                rgb[2] as f32 / 255.0,
            ),
        }
    }
}

/// Mean of the RGB channels, in [0, 255].
pub fn brightness(rgba: [u8; 4]) -> f64 {
    (rgba[0] as f64 + rgba[1] as f64 + rgba[2] as f64) / 3.0
}

/// Samples `target_count` pixels from `raster`.
///
/// Returns `InvalidParticleCount` for a zero target and `NoVisiblePixels`
/// when no pixel passes the alpha threshold; callers route the latter to
/// the fallback sphere.
pub fn sample<R: RandomSource + ?Sized>(
    raster: &Raster,
    target_count: usize,
    scale: f32,
    rng: &mut R,
) -> Result<Vec<PixelSample>, PortraitError> {
    if target_count == 0 {
        return Err(PortraitError::InvalidParticleCount);
    }
    let pool = candidate_pool(raster, target_count, scale, rng);
    if pool.is_empty() {
        return Err(PortraitError::NoVisiblePixels);
    }
    debug!(
        "sampled {} candidates from {}x{} raster for {} particles",
        pool.len(),
        raster.width(),
        raster.height(),
        target_count
    );
    Ok(downsample(&pool, target_count, rng))
}

/// Collects accepted pixels in row-major order.
pub fn candidate_pool<R: RandomSource + ?Sized>(
    raster: &Raster,
    target_count: usize,
    scale: f32,
    rng: &mut R,
) -> Vec<PixelSample> {
    let (w, h) = (raster.width(), raster.height());
    let mut pool = Vec::new();
    for (x, y, px) in raster.pixels() {
        if px[3] <= VISIBLE_ALPHA {
            continue;
        }
        let forced = pool.len() * 2 < target_count;
        if forced || rng.chance(brightness(px) / 255.0) {
            pool.push(PixelSample::from_pixel(
                x,
                y,
                w,
                h,
                [px[0], px[1], px[2]],
                scale,
            ));
        }
    }
    pool
}

/// Strides through `pool` and pads with random picks until `target_count`.
///
/// A zero `target_count` yields an empty vector.
///
/// # Panics
///
/// Panics if `pool` is empty and `target_count` is non-zero.
pub fn downsample<R: RandomSource + ?Sized>(
    pool: &[PixelSample],
    target_count: usize,
    rng: &mut R,
) -> Vec<PixelSample> {
    if target_count == 0 {
        return Vec::new();
    }
    let step = (pool.len() / target_count).max(1);
    let mut out = Vec::with_capacity(target_count);
    out.extend(pool.iter().step_by(step).take(target_count).copied());
    while out.len() < target_count {
        out.push(pool[rng.index(pool.len())]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Xorshift64;

    fn rng() -> Xorshift64 {
        Xorshift64::new(42)
    }

    #[test]
    fn corner_pixels_map_to_scaled_square() {
        let s = PixelSample::from_pixel(0, 0, 400, 400, [255, 0, 0], 6.0);
        assert_eq!(s.position, Vec3::new(-3.0, 3.0, 0.0));
        assert_eq!(s.color, Vec3::new(1.0, 0.0, 0.0));

        let c = PixelSample::from_pixel(200, 200, 400, 400, [0, 0, 0], 6.0);
        assert_eq!(c.position, Vec3::ZERO);
    }

    #[test]
    fn y_axis_is_flipped() {
        let top = PixelSample::from_pixel(10, 0, 100, 100, [0; 3], 6.0);
        let bottom = PixelSample::from_pixel(10, 99, 100, 100, [0; 3], 6.0);
        assert!(top.position.y > bottom.position.y);
    }

    #[test]
    fn black_image_still_fills_half_the_target() {
        let raster = Raster::filled(400, 400, [0, 0, 0, 255]).unwrap();
        let pool = candidate_pool(&raster, 15_000, 6.0, &mut rng());
        assert_eq!(pool.len(), 7_500);
    }

    #[test]
    fn white_image_accepts_every_visible_pixel() {
        let raster = Raster::filled(50, 40, [255, 255, 255, 255]).unwrap();
        let pool = candidate_pool(&raster, 10, 6.0, &mut rng());
        assert_eq!(pool.len(), 50 * 40);
    }

    #[test]
    fn transparent_pixels_are_never_sampled() {
        let mut raster = Raster::filled(20, 20, [255, 255, 255, 0]).unwrap();
        raster.set_pixel(5, 7, [255, 255, 255, 255]);
        let pool = candidate_pool(&raster, 100, 6.0, &mut rng());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0], PixelSample::from_pixel(5, 7, 20, 20, [255; 3], 6.0));
    }

    #[test]
    fn fully_transparent_image_is_an_error() {
        let raster = Raster::filled(8, 8, [255, 255, 255, 10]).unwrap();
        assert!(matches!(
            sample(&raster, 100, 6.0, &mut rng()),
            Err(PortraitError::NoVisiblePixels)
        ));
    }

    #[test]
    fn zero_target_is_an_error() {
        let raster = Raster::filled(8, 8, [255; 4]).unwrap();
        assert!(matches!(
            sample(&raster, 0, 6.0, &mut rng()),
            Err(PortraitError::InvalidParticleCount)
        ));
    }

    #[test]
    fn single_candidate_is_padded_to_exact_count() {
        let mut raster = Raster::filled(10, 10, [0, 0, 0, 0]).unwrap();
        raster.set_pixel(3, 3, [200, 100, 50, 255]);
        let samples = sample(&raster, 15_000, 6.0, &mut rng()).unwrap();
        assert_eq!(samples.len(), 15_000);
        assert!(samples.iter().all(|s| *s == samples[0]));
    }

    #[test]
    fn downsample_strides_through_large_pool() {
        let pool: Vec<PixelSample> = (0..100)
            .map(|i| PixelSample::from_pixel(i, 0, 100, 1, [0; 3], 1.0))
            .collect();
        let out = downsample(&pool, 10, &mut rng());
        assert_eq!(out.len(), 10);
        for (k, s) in out.iter().enumerate() {
            assert_eq!(*s, pool[k * 10]);
        }
    }

    #[test]
    fn downsample_keeps_prefix_when_stride_overshoots() {
        // 25 / 10 floors to a stride of 2, which covers the target early.
        let pool: Vec<PixelSample> = (0..25)
            .map(|i| PixelSample::from_pixel(i, 0, 25, 1, [0; 3], 1.0))
            .collect();
        let out = downsample(&pool, 10, &mut rng());
        assert_eq!(out.len(), 10);
        assert_eq!(out[9], pool[18]);
    }

    #[test]
    fn downsample_to_zero_is_empty() {
        let pool = [PixelSample::from_pixel(0, 0, 1, 1, [255; 3], 1.0)];
        assert!(downsample(&pool, 0, &mut rng()).is_empty());
        assert!(downsample(&[], 0, &mut rng()).is_empty());
    }

    #[test]
    fn same_seed_same_samples() {
        let mut raster = Raster::filled(64, 64, [90, 140, 200, 255]).unwrap();
        raster.set_pixel(0, 0, [0, 0, 0, 0]);
        let a = sample(&raster, 1_000, 6.0, &mut Xorshift64::new(9)).unwrap();
        let b = sample(&raster, 1_000, 6.0, &mut Xorshift64::new(9)).unwrap();
        assert_eq!(a, b);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sample_count_is_exact(
                seed: u64,
                w in 1_usize..40,
                h in 1_usize..40,
                gray: u8,
                target in 1_usize..3_000,
            ) {
                let raster = Raster::filled(w, h, [gray, gray, gray, 255]).unwrap();
                let samples = sample(&raster, target, 6.0, &mut Xorshift64::new(seed)).unwrap();
                prop_assert_eq!(samples.len(), target);
            }

            #[test]
            fn samples_stay_inside_scaled_square(seed: u64, gray: u8, scale in 0.5_f32..20.0) {
                let raster = Raster::filled(16, 16, [gray, gray, gray, 255]).unwrap();
                let samples = sample(&raster, 200, scale, &mut Xorshift64::new(seed)).unwrap();
                let half = scale / 2.0;
                for s in samples {
                    prop_assert!(s.position.x >= -half && s.position.x < half);
                    prop_assert!(s.position.y > -half && s.position.y <= half);
                    prop_assert_eq!(s.position.z, 0.0);
                }
            }
        }
    }
}

//! The particle field: fixed-size, contiguous attribute buffers.
//!
//! Every particle owns a scattered origin, a target, a current position, a
//! color, and a size. Positions and colors are stored as packed xyz / rgb
//! triplets and sizes as one scalar per particle, matching the vertex
//! attribute layout a point renderer uploads. All buffers are allocated at
//! construction; [`ParticleField::step`] only overwrites values in place.

use std::f32::consts::TAU;

use glam::{EulerRot, Mat4, Vec3};

use crate::animator::ease_out_cubic;
use crate::config::PortraitConfig;
use crate::error::PortraitError;
use crate::prng::RandomSource;
use crate::sampler::PixelSample;

/// Inner radius of the scatter shell as a fraction of the outer radius.
const SHELL_INNER: f32 = 0.5;
/// Smallest per-particle size multiplier.
const SIZE_JITTER_MIN: f32 = 0.5;

/// Where the target positions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Image,
    /// Procedural sphere used when the image could not be loaded.
    FallbackSphere,
}

/// A copied-out view of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub original: Vec3,
    pub target: Vec3,
    pub current: Vec3,
    pub color: Vec3,
    pub size: f32,
}

/// Uniform direction on the unit sphere: `theta = U * 2pi`, `phi = acos(2U - 1)`.
fn unit_direction<R: RandomSource + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = rng.next_f32() * TAU;
    let phi = (2.0 * rng.next_f32() - 1.0).clamp(-1.0, 1.0).acos();
    Vec3::new(
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
    )
}

/// Point in the shell between `radius / 2` and `radius`.
pub fn shell_point<R: RandomSource + ?Sized>(radius: f32, rng: &mut R) -> Vec3 {
    let dir = unit_direction(rng);
    let r = radius * (SHELL_INNER + (1.0 - SHELL_INNER) * rng.next_f32());
    dir * r
}

/// Point on the surface of a sphere of `radius`.
pub fn sphere_point<R: RandomSource + ?Sized>(radius: f32, rng: &mut R) -> Vec3 {
    unit_direction(rng) * radius
}

fn write3(buf: &mut [f32], i: usize, v: Vec3) {
    buf[i * 3..i * 3 + 3].copy_from_slice(&v.to_array());
}

fn read3(buf: &[f32], i: usize) -> Vec3 {
    Vec3::from_slice(&buf[i * 3..i * 3 + 3])
}

/// Fixed-size point cloud interpolating from scatter to target.
#[derive(Debug, Clone)]
pub struct ParticleField {
    count: usize,
    original: Vec<f32>,
    target: Vec<f32>,
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    progress: f32,
    eased: f32,
    rotation: Vec3,
    dirty: bool,
    source: TargetSource,
}

impl ParticleField {
    /// Allocates all buffers and fills per-particle attributes.
    ///
    /// `fill(i, rng)` returns `(target, color)` for particle `i`; the scatter
    /// origin and size jitter are drawn here afterwards.
    fn build<R, F>(
        config: &PortraitConfig,
        source: TargetSource,
        rng: &mut R,
        mut fill: F,
    ) -> Result<Self, PortraitError>
    where
        R: RandomSource + ?Sized,
        F: FnMut(usize, &mut R) -> (Vec3, Vec3),
    {
        let count = config.particle_count;
        if count == 0 {
            return Err(PortraitError::InvalidParticleCount);
        }
        let len3 = count
            .checked_mul(3)
            .ok_or(PortraitError::InvalidParticleCount)?;
        let mut field = Self {
            count,
            original: vec![0.0; len3],
            target: vec![0.0; len3],
            positions: vec![0.0; len3],
            colors: vec![0.0; len3],
            sizes: vec![0.0; count],
            progress: 0.0,
            eased: 0.0,
            rotation: Vec3::ZERO,
            dirty: true,
            source,
        };
        for i in 0..count {
            let (target, color) = fill(i, rng);
            let origin = shell_point(config.scatter_radius, rng);
            write3(&mut field.target, i, target);
            write3(&mut field.original, i, origin);
            write3(&mut field.positions, i, origin);
            write3(&mut field.colors, i, color);
            field.sizes[i] = config.particle_size * rng.range_f32(SIZE_JITTER_MIN, 1.0);
        }
        Ok(field)
    }

    /// Builds a field whose targets are the given samples, cycling through
    /// them when there are fewer samples than particles.
    pub fn from_samples<R: RandomSource + ?Sized>(
        samples: &[PixelSample],
        config: &PortraitConfig,
        rng: &mut R,
    ) -> Result<Self, PortraitError> {
        if samples.is_empty() {
            return Err(PortraitError::NoVisiblePixels);
        }
        Self::build(config, TargetSource::Image, rng, |i, _| {
            let s = samples[i % samples.len()];
            (s.position, s.color)
        })
    }

    /// Builds a field whose targets lie on a sphere of `config.fallback_radius`
    /// with blue-violet tinted colors.
    pub fn fallback<R: RandomSource + ?Sized>(
        config: &PortraitConfig,
        rng: &mut R,
    ) -> Result<Self, PortraitError> {
        let radius = config.fallback_radius;
        Self::build(config, TargetSource::FallbackSphere, rng, |_, rng| {
            let target = sphere_point(radius, rng);
            let color = Vec3::new(
                rng.range_f32(0.4, 0.6),
                rng.range_f32(0.4, 0.6),
                rng.range_f32(0.8, 1.0),
            );
            (target, color)
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false: a field holds at least one particle.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn source(&self) -> TargetSource {
        self.source
    }

    /// Stores the progress used by the next [`step`](Self::step).
    ///
    /// Values are clamped to [0, 1]; NaN is ignored.
    pub fn set_progress(&mut self, progress: f32) {
        if progress.is_nan() {
            return;
        }
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Eased progress applied by the most recent `step`.
    pub fn eased_progress(&self) -> f32 {
        self.eased
    }

    /// Re-interpolates every particle at the eased stored progress and
    /// marks the position buffer dirty.
    ///
    /// Uses `a * (1 - e) + b * e`, which is exact at both endpoints.
    pub fn step(&mut self) {
        let e = ease_out_cubic(self.progress);
        let keep = 1.0 - e;
        for ((cur, &a), &b) in self
            .positions
            .iter_mut()
            .zip(&self.original)
            .zip(&self.target)
        {
            *cur = a * keep + b * e;
        }
        self.eased = e;
        self.dirty = true;
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Model matrix of the cloud (XYZ Euler order).
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether positions changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Current positions as packed xyz triplets.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn original_positions(&self) -> &[f32] {
        &self.original
    }

    pub fn target_positions(&self) -> &[f32] {
        &self.target
    }

    /// Colors as packed rgb triplets in [0, 1].
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn particle(&self, i: usize) -> Option<Particle> {
        if i >= self.count {
            return None;
        }
        Some(Particle {
            original: read3(&self.original, i),
            target: read3(&self.target, i),
            current: read3(&self.positions, i),
            color: read3(&self.colors, i),
            size: self.sizes[i],
        })
    }

    pub fn particles(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.count).filter_map(move |i| self.particle(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Xorshift64;
    use crate::raster::Raster;
    use crate::sampler::sample;

    fn config(count: usize) -> PortraitConfig {
        PortraitConfig {
            particle_count: count,
            ..PortraitConfig::default()
        }
    }

    fn image_field(count: usize, seed: u64) -> ParticleField {
        let raster = Raster::filled(32, 32, [180, 120, 60, 255]).unwrap();
        let mut rng = Xorshift64::new(seed);
        let samples = sample(&raster, count, 6.0, &mut rng).unwrap();
        ParticleField::from_samples(&samples, &config(count), &mut rng).unwrap()
    }

    #[test]
    fn buffers_have_packed_lengths() {
        let f = image_field(100, 1);
        assert_eq!(f.len(), 100);
        assert_eq!(f.positions().len(), 300);
        assert_eq!(f.colors().len(), 300);
        assert_eq!(f.sizes().len(), 100);
        assert_eq!(f.source(), TargetSource::Image);
    }

    #[test]
    fn starts_at_scattered_positions() {
        let f = image_field(200, 2);
        assert_eq!(f.positions(), f.original_positions());
        assert!(f.is_dirty());
    }

    #[test]
    fn default_count_is_exact_from_a_single_pixel() {
        let mut raster = Raster::filled(400, 400, [0, 0, 0, 0]).unwrap();
        raster.set_pixel(200, 100, [255, 255, 255, 255]);
        let mut rng = Xorshift64::new(5);
        let cfg = PortraitConfig::default();
        let samples = sample(&raster, cfg.particle_count, cfg.sample_scale, &mut rng).unwrap();
        let f = ParticleField::from_samples(&samples, &cfg, &mut rng).unwrap();
        assert_eq!(f.len(), 15_000);
        assert!(f.positions().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn short_sample_list_cycles() {
        let samples = [
            PixelSample::from_pixel(0, 0, 2, 2, [255, 0, 0], 6.0),
            PixelSample::from_pixel(1, 1, 2, 2, [0, 255, 0], 6.0),
        ];
        let f = ParticleField::from_samples(&samples, &config(5), &mut Xorshift64::new(3)).unwrap();
        for i in 0..5 {
            let p = f.particle(i).unwrap();
            assert_eq!(p.target, samples[i % 2].position);
            assert_eq!(p.color, samples[i % 2].color);
        }
    }

    #[test]
    fn empty_samples_are_rejected() {
        let err = ParticleField::from_samples(&[], &config(10), &mut Xorshift64::new(1)).unwrap_err();
        assert!(matches!(err, PortraitError::NoVisiblePixels));
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(matches!(
            ParticleField::fallback(&config(0), &mut Xorshift64::new(1)),
            Err(PortraitError::InvalidParticleCount)
        ));
    }

    #[test]
    fn scatter_lies_in_shell() {
        let f = image_field(2_000, 4);
        let r = PortraitConfig::default().scatter_radius;
        for p in f.particles() {
            let d = p.original.length();
            assert!(d >= r * 0.5 - 1e-4 && d <= r + 1e-4, "origin radius {d}");
        }
    }

    #[test]
    fn scatter_is_three_dimensional() {
        let f = image_field(2_000, 6);
        let zs: Vec<f32> = f.particles().map(|p| p.original.z).collect();
        assert!(zs.iter().any(|&z| z > 2.0));
        assert!(zs.iter().any(|&z| z < -2.0));
    }

    #[test]
    fn sizes_are_jittered_base_size() {
        let f = image_field(1_000, 7);
        let base = PortraitConfig::default().particle_size;
        assert!(f
            .sizes()
            .iter()
            .all(|&s| s >= base * 0.5 && s < base * 1.0 + 1e-6));
    }

    #[test]
    fn fallback_targets_lie_on_sphere() {
        let cfg = config(15_000);
        let f = ParticleField::fallback(&cfg, &mut Xorshift64::new(8)).unwrap();
        assert_eq!(f.len(), 15_000);
        assert_eq!(f.source(), TargetSource::FallbackSphere);
        for p in f.particles() {
            assert!((p.target.length() - cfg.fallback_radius).abs() < 1e-4);
            assert!(p.color.z >= 0.8 && p.color.x <= 0.6 && p.color.y <= 0.6);
        }
    }

    #[test]
    fn progress_zero_is_exactly_original() {
        let mut f = image_field(500, 9);
        f.set_progress(0.0);
        f.step();
        assert_eq!(f.positions(), f.original_positions());
    }

    #[test]
    fn progress_one_is_exactly_target() {
        let mut f = image_field(500, 10);
        f.set_progress(1.0);
        f.step();
        assert_eq!(f.positions(), f.target_positions());
    }

    #[test]
    fn set_progress_clamps_and_ignores_nan() {
        let mut f = image_field(10, 11);
        f.set_progress(3.0);
        assert_eq!(f.progress(), 1.0);
        f.set_progress(-1.0);
        assert_eq!(f.progress(), 0.0);
        f.set_progress(0.25);
        f.set_progress(f32::NAN);
        assert_eq!(f.progress(), 0.25);
    }

    #[test]
    fn set_progress_does_not_move_particles() {
        let mut f = image_field(50, 12);
        f.set_progress(1.0);
        assert_eq!(f.positions(), f.original_positions());
    }

    #[test]
    fn step_reuses_buffers() {
        let mut f = image_field(300, 13);
        let before = f.positions().as_ptr();
        for i in 0..=10 {
            f.set_progress(i as f32 / 10.0);
            f.step();
        }
        assert_eq!(f.positions().as_ptr(), before);
    }

    #[test]
    fn take_dirty_clears_flag_until_next_step() {
        let mut f = image_field(10, 14);
        assert!(f.take_dirty());
        assert!(!f.is_dirty());
        f.step();
        assert!(f.take_dirty());
    }

    #[test]
    fn model_matrix_follows_rotation() {
        let mut f = image_field(10, 15);
        assert_eq!(f.model_matrix(), Mat4::IDENTITY);
        f.set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let x = f.model_matrix().transform_point3(Vec3::X);
        assert!((x - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn distance_to_target_never_grows(seed: u64, steps in 2_usize..40) {
                let mut f = ParticleField::fallback(&config(64), &mut Xorshift64::new(seed)).unwrap();
                let mut prev: Vec<f32> = f.particles().map(|p| (p.target - p.current).length()).collect();
                for k in 1..=steps {
                    f.set_progress(k as f32 / steps as f32);
                    f.step();
                    for (i, p) in f.particles().enumerate() {
                        let d = (p.target - p.current).length();
                        prop_assert!(d <= prev[i] + 1e-4, "particle {i}: {d} > {}", prev[i]);
                        prev[i] = d;
                    }
                }
            }

            #[test]
            fn endpoints_exact_for_any_seed(seed: u64) {
                let mut f = ParticleField::fallback(&config(128), &mut Xorshift64::new(seed)).unwrap();
                f.set_progress(1.0);
                f.step();
                prop_assert_eq!(f.positions(), f.target_positions());
                f.set_progress(0.0);
                f.step();
                prop_assert_eq!(f.positions(), f.original_positions());
            }

            #[test]
            fn count_matches_request(seed: u64, count in 1_usize..5_000) {
                let f = ParticleField::fallback(&config(count), &mut Xorshift64::new(seed)).unwrap();
                prop_assert_eq!(f.len(), count);
                prop_assert_eq!(f.positions().len(), count * 3);
            }
        }
    }
}

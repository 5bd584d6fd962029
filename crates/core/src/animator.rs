//! Per-frame driver: eases scroll progress into the particle field.
//!
//! The [`Animator`] is called from the host's display callback. Each tick it
//! reads the tracker's progress, lets the field re-interpolate every
//! particle in place, and derives the small cosmetic rotation of the cloud.
//!
//! The portrait redraws on every display refresh ([`FramePacing::Uncapped`]).
//! The site's hero scene instead throttles to about 60 frames per second;
//! [`FramePacing::Capped`] reproduces that for hosts that want the two
//! loops to match, but it is not the portrait default.

use std::f32::consts::PI;

use glam::Vec3;

use crate::particles::ParticleField;
use crate::scroll::ScrollTracker;

/// Yaw reached at full progress, as a fraction of pi.
const MAX_YAW_TURNS: f32 = 0.2;
/// Peak pitch wobble in radians, reached at half progress.
const PITCH_WOBBLE: f32 = 0.1;

/// Ease-out-cubic: `1 - (1 - t)^3`. Monotonic on [0, 1] with fixed endpoints.
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Euler rotation (XYZ order) applied to the cloud for a given eased progress.
pub fn field_rotation(eased: f32) -> Vec3 {
    Vec3::new(
        (eased * PI).sin() * PITCH_WOBBLE,
        eased * PI * MAX_YAW_TURNS,
        0.0,
    )
}

/// How often the animator lets a tick through.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FramePacing {
    /// Recompute on every display refresh.
    #[default]
    Uncapped,
    /// Skip ticks that arrive sooner than `1000 / fps` ms after the last one.
    Capped { fps: f32 },
}

impl FramePacing {
    fn min_interval_ms(self) -> Option<f64> {
        match self {
            FramePacing::Uncapped => None,
            FramePacing::Capped { fps } if fps > 0.0 => Some(1000.0 / fps as f64),
            FramePacing::Capped { .. } => None,
        }
    }
}

/// Drives a [`ParticleField`] from a [`ScrollTracker`].
#[derive(Debug, Clone, Default)]
pub struct Animator {
    pacing: FramePacing,
    last_frame_ms: Option<f64>,
    frames: u64,
}

impl Animator {
    pub fn new(pacing: FramePacing) -> Self {
        Self {
            pacing,
            last_frame_ms: None,
            frames: 0,
        }
    }

    pub fn pacing(&self) -> FramePacing {
        self.pacing
    }

    /// Number of ticks that recomputed the field.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one display tick at host time `now_ms`.
    ///
    /// Returns `false` when the pacing skipped this tick; the field is left
    /// untouched and the host need not redraw.
    pub fn tick(&mut self, now_ms: f64, tracker: &ScrollTracker, field: &mut ParticleField) -> bool {
        if let (Some(interval), Some(last)) = (self.pacing.min_interval_ms(), self.last_frame_ms) {
            if now_ms - last < interval {
                return false;
            }
        }
        self.last_frame_ms = Some(now_ms);
        self.frames += 1;

        field.set_progress(tracker.progress());
        field.step();
        let eased = field.eased_progress();
        field.set_rotation(field_rotation(eased));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortraitConfig;
    use crate::prng::Xorshift64;
    use crate::scroll::SectionBounds;

    fn field() -> ParticleField {
        let config = PortraitConfig {
            particle_count: 64,
            ..PortraitConfig::default()
        };
        ParticleField::fallback(&config, &mut Xorshift64::new(1)).unwrap()
    }

    #[test]
    fn ease_endpoints_are_exact() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
    }

    #[test]
    fn ease_runs_ahead_of_linear() {
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!(ease_out_cubic(t) > t, "ease({t}) should exceed {t}");
        }
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut prev = ease_out_cubic(0.0);
        for i in 1..=1000 {
            let e = ease_out_cubic(i as f32 / 1000.0);
            assert!(e >= prev);
            prev = e;
        }
    }

    #[test]
    fn rotation_is_zero_when_scattered_and_settles_at_full_progress() {
        assert_eq!(field_rotation(0.0), Vec3::ZERO);
        let full = field_rotation(1.0);
        assert!((full.y - PI * 0.2).abs() < 1e-6);
        assert!(full.x.abs() < 1e-6);
        assert!((field_rotation(0.5).x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn uncapped_recomputes_every_tick() {
        let mut animator = Animator::default();
        let tracker = ScrollTracker::new();
        let mut f = field();
        for i in 0..5 {
            assert!(animator.tick(i as f64 * 0.5, &tracker, &mut f));
        }
        assert_eq!(animator.frames(), 5);
    }

    #[test]
    fn capped_skips_early_ticks() {
        let mut animator = Animator::new(FramePacing::Capped { fps: 60.0 });
        let tracker = ScrollTracker::new();
        let mut f = field();
        assert!(animator.tick(0.0, &tracker, &mut f));
        assert!(!animator.tick(5.0, &tracker, &mut f));
        assert!(animator.tick(17.0, &tracker, &mut f));
        assert_eq!(animator.frames(), 2);
    }

    #[test]
    fn tick_applies_tracker_progress_to_field() {
        let mut animator = Animator::default();
        let mut tracker = ScrollTracker::new();
        tracker.on_scroll(SectionBounds::new(-100.0, 900.0), 1000.0);
        let mut f = field();
        animator.tick(0.0, &tracker, &mut f);
        assert_eq!(f.positions(), f.target_positions());
        assert!(f.is_dirty());
        assert!((f.rotation().y - PI * 0.2).abs() < 1e-6);
    }

    #[test]
    fn skipped_tick_leaves_field_clean() {
        let mut animator = Animator::new(FramePacing::Capped { fps: 30.0 });
        let tracker = ScrollTracker::new();
        let mut f = field();
        animator.tick(0.0, &tracker, &mut f);
        f.take_dirty();
        animator.tick(1.0, &tracker, &mut f);
        assert!(!f.is_dirty());
    }
}

//! Point-sprite appearance shared by the GPU shader and the CPU splatter.
//!
//! Each particle is drawn as a round sprite whose diameter shrinks with
//! distance and whose alpha falls off quadratically from the centre. Colors
//! are multiplied by the glow intensity and blended additively.

/// Numerator of the perspective size attenuation `size * (300 / depth)`.
pub const POINT_SCALE: f32 = 300.0;

/// Sprite diameter in pixels for a particle of `size` at view `depth`.
///
/// Returns 0 for points at or behind the eye.
pub fn sprite_diameter(size: f32, depth: f32) -> f32 {
    if depth <= 0.0 {
        return 0.0;
    }
    size * (POINT_SCALE / depth)
}

/// Alpha at normalized distance `d` from the sprite centre (`0.5` = rim).
///
/// `(1 - 2d)^2` inside the disc, `None` outside (the fragment is discarded).
pub fn sprite_alpha(d: f32) -> Option<f32> {
    if d > 0.5 {
        return None;
    }
    let a = 1.0 - d * 2.0;
    Some(a * a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_one_at_centre_and_zero_at_rim() {
        assert_eq!(sprite_alpha(0.0), Some(1.0));
        assert_eq!(sprite_alpha(0.5), Some(0.0));
        assert_eq!(sprite_alpha(0.25), Some(0.25));
    }

    #[test]
    fn outside_disc_is_discarded() {
        assert_eq!(sprite_alpha(0.51), None);
    }

    #[test]
    fn diameter_attenuates_with_depth() {
        assert_eq!(sprite_diameter(2.0, 12.0), 50.0);
        assert!(sprite_diameter(2.0, 24.0) < sprite_diameter(2.0, 12.0));
        assert_eq!(sprite_diameter(2.0, 0.0), 0.0);
        assert_eq!(sprite_diameter(2.0, -3.0), 0.0);
    }
}

//! Seedable random source for sampling and scatter generation.
//!
//! Every stochastic step of the portrait (pixel acceptance, padding,
//! shell scatter, size jitter, fallback sphere) draws from a
//! [`RandomSource`] passed in by the caller, so a fixed seed reproduces the
//! same particle cloud on every platform.

use serde::{Deserialize, Serialize};

/// A source of uniform random numbers.
///
/// Only [`next_u64`](RandomSource::next_u64) must be implemented; the
/// remaining methods derive floats, indices, and coin flips from it.
pub trait RandomSource {
    /// Returns the next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform f64 in [0, 1) built from the upper 53 bits.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f32 in [0, 1).
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }

    /// Uniform f32 in [min, max).
    fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform index in [0, len).
    ///
    /// # Panics
    ///
    /// Panics if `len` is 0.
    fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Returns `true` with probability `p` (values outside [0, 1] saturate).
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Xorshift64 PRNG with shifts (13, 7, 17).
///
/// A zero seed is replaced by a fixed non-zero constant, since zero is a
/// fixed point of the recurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }
}

impl RandomSource for Xorshift64 {
    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

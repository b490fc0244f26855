//! Seeded simulation RNG

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic RNG shared by every simulation system
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    rng: Pcg32,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform in [0, 1)
    #[inline]
    pub fn uniform(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform in [min, max)
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.uniform() * (max - min)
    }

    /// True with probability `p`
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.uniform() < p
    }

    /// Uniform angle in [0, 2π)
    #[inline]
    pub fn angle(&mut self) -> f32 {
        self.uniform() * std::f32::consts::TAU
    }

    /// Animation speed jitter in [0.8, 1.2)
    #[inline]
    pub fn jitter(&mut self) -> f32 {
        0.8 + self.uniform() * 0.4
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rng.random_range(0..=i);
            items.swap(i, j);
        }
    }
}

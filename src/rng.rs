//! Seeded random source shared by every stochastic decision of a run.

use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Seeded pseudo-random generator.
///
/// The seed is recorded before the stream is built, so a run can always be
/// replayed with [`RandomSource::reseed`] and [`RandomSource::current_seed`].
pub struct RandomSource {
    seed: i64,
    rng: ChaCha12Rng,
}

impl RandomSource {
    /// Create a source from a fixed seed.
    pub fn from_seed(seed: i64) -> Self {
        Self {
            seed,
            rng: ChaCha12Rng::seed_from_u64(seed as u64),
        }
    }

    /// Create a source with a fresh random seed.
    pub fn from_fresh_seed() -> Self {
        Self::from_seed(rand::random())
    }

    /// Uniform integer in `0..bound`. `bound` must be positive.
    pub fn next_int(&mut self, bound: i32) -> i32 {
        assert!(bound > 0, "bound must be positive, but is {bound}");
        self.rng.random_range(0..bound)
    }

    pub fn next_long(&mut self) -> i64 {
        self.rng.random()
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.random()
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.rng.random()
    }

    pub fn current_seed(&self) -> i64 {
        self.seed
    }

    /// Restart the stream from `seed`, or from a fresh seed when `None`.
    pub fn reseed(&mut self, seed: Option<i64>) {
        *self = match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_fresh_seed(),
        };
    }
}

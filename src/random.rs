//! Random sources for simulated metrics
//!
//! Every synthetic value drawn by a sampling routine goes through
//! [`RandomSource`], so a seeded or scripted source makes routine output exact.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniformly distributed reals
pub trait RandomSource: Send {
    /// Draw a value in the closed range `[min, max]`
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

/// `StdRng`-backed source, seedable for reproducible sessions
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when a seed is configured, entropy otherwise
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::new)
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Replays fractions of each requested range
///
/// Each draw pops the next fraction `f` in `[0, 1]` and yields
/// `min + (max - min) * f`. Once the script runs out the fallback fraction is
/// used for every draw.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    fractions: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(fractions: impl IntoIterator<Item = f64>) -> Self {
        Self {
            fractions: fractions.into_iter().collect(),
            fallback: 0.5,
        }
    }

    /// Always yield the same fraction of the range
    pub fn constant(fraction: f64) -> Self {
        Self {
            fractions: VecDeque::new(),
            fallback: fraction,
        }
    }

    /// Always yield the midpoint of the range
    pub fn midpoint() -> Self {
        Self::constant(0.5)
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        let fraction = self
            .fractions
            .pop_front()
            .unwrap_or(self.fallback)
            .clamp(0.0, 1.0);
        min + (max - min) * fraction
    }
}

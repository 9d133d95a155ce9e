//! Randomness used for reviewer selection.
//!
//! Selection is uniform: every eligible candidate has the same chance of
//! being picked. The source is injected so tests can fix the outcome.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Source of uniform random choices.
pub trait RandomSource: Send + Sync {
    /// Shuffle `items` in place (uniform permutation).
    fn shuffle(&self, items: &mut [String]);

    /// Pick an index in `0..len`, or `None` if `len == 0`.
    fn pick(&self, len: usize) -> Option<usize>;
}

/// Thread-local RNG. A fresh handle is taken per call, so this is safe to
/// share across tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn shuffle(&self, items: &mut [String]) {
        items.shuffle(&mut rand::thread_rng());
    }

    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..len))
    }
}

/// Deterministic RNG seeded from a `u64`; same seed, same sequence.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn shuffle(&self, items: &mut [String]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        items.shuffle(&mut *rng);
    }

    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Some(rng.gen_range(0..len))
    }
}

/// Fixed-outcome sources for tests.
pub mod mock {
    use super::RandomSource;

    /// Never reorders and always picks the first candidate.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FirstChoice;

    impl RandomSource for FirstChoice {
        fn shuffle(&self, _items: &mut [String]) {}

        fn pick(&self, len: usize) -> Option<usize> {
            (len > 0).then_some(0)
        }
    }

    /// Reverses on shuffle and always picks the last candidate.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LastChoice;

    impl RandomSource for LastChoice {
        fn shuffle(&self, items: &mut [String]) {
            items.reverse();
        }

        fn pick(&self, len: usize) -> Option<usize> {
            len.checked_sub(1)
        }
    }
}

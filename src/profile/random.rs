//! Injectable, seedable random source.

use std::sync::{Arc, Mutex, PoisonError};

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MillisRange;

const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Shared random source.
///
/// Every randomized decision in the crate goes through this type so that a
/// seeded instance makes a whole run reproducible. Clones share one generator.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: Arc<Mutex<StdRng>>,
}

impl RandomSource {
    /// Seeds from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Seeds deterministically.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Seeds from `seed` when present, otherwise from entropy.
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Runs `f` with exclusive access to the generator.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Uniform index in `0..len`; `len` must be non-zero.
    #[must_use]
    pub fn index(&self, len: usize) -> usize {
        debug_assert!(len > 0, "index drawn from an empty pool");
        self.with_rng(|rng| rng.gen_range(0..len.max(1)))
    }

    /// Uniform integer in `low..=high`.
    #[must_use]
    pub fn int_in(&self, low: u32, high: u32) -> u32 {
        self.with_rng(|rng| rng.gen_range(low..=high.max(low)))
    }

    /// Uniform millisecond value in the inclusive range.
    #[must_use]
    pub fn millis_in(&self, range: MillisRange) -> u64 {
        self.with_rng(|rng| rng.gen_range(range.min..=range.max.max(range.min)))
    }

    /// Picks one element of a non-empty slice.
    #[must_use]
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.index(items.len()))
    }

    /// `len` characters from `[A-Za-z0-9]`.
    #[must_use]
    pub fn alphanumeric(&self, len: usize) -> String {
        self.with_rng(|rng| {
            rng.sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        })
    }

    /// `len` characters from `[a-z0-9]`.
    #[must_use]
    pub fn lower_alphanumeric(&self, len: usize) -> String {
        self.with_rng(|rng| {
            (0..len)
                .map(|_| char::from(LOWER_ALPHANUMERIC[rng.gen_range(0..LOWER_ALPHANUMERIC.len())]))
                .collect()
        })
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

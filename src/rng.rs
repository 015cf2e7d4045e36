//! Seeded deterministic RNG.
//!
//! Generation must be reproducible: the same seed string and the same crate
//! version always produce the same sequence of draws. Built on top of
//! `rand`'s `SeedableRng`/`RngCore` traits rather than a hand-rolled PRNG,
//! following the seeded-RNG pattern `ouros` uses for its own reproducible
//! execution (`rand::{Rng, SeedableRng, rngs::StdRng}`).

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// Minimum number of user-supplied seed bytes required, not counting the
/// internal version tag mixed in for forward compatibility. Pinned from the
/// original engine's `kMinSeedLength`.
pub const MIN_SEED_LENGTH: usize = 15;

/// The version tag mixed into every seed. Bumping this deliberately breaks
/// reproducibility across incompatible engine versions while keeping it
/// stable within a version.
const SEED_VERSION_TAG: u64 = 1;

/// A seeded, deterministic source of pseudo-random integers.
///
/// Two `Rng`s constructed from the same seed bytes produce identical
/// sequences of `below`/`between` draws, for the same crate version.
#[derive(Debug, Clone)]
pub struct Rng {
    inner: StdRng,
}

impl Rng {
    /// Builds a new RNG from a user-supplied seed.
    ///
    /// # Errors
    ///
    /// Returns an error message if `seed` has fewer than [`MIN_SEED_LENGTH`]
    /// bytes.
    pub fn new(seed: &[u8]) -> Result<Self, String> {
        if seed.len() < MIN_SEED_LENGTH {
            return Err(format!(
                "seed must be at least {MIN_SEED_LENGTH} bytes, got {}",
                seed.len()
            ));
        }
        let expanded = expand_seed(seed);
        Ok(Self {
            inner: StdRng::from_seed(expanded),
        })
    }

    /// Draws a uniform integer in `[0, n)`.
    ///
    /// # Errors
    ///
    /// Returns an error message if `n < 1`.
    pub fn below(&mut self, n: i64) -> Result<i64, String> {
        if n < 1 {
            return Err(format!("below(n) requires n >= 1, got {n}"));
        }
        Ok(self.inner.gen_range(0..n))
    }

    /// Draws a uniform integer in `[lo, hi]` inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error message if `lo > hi`.
    pub fn between(&mut self, lo: i64, hi: i64) -> Result<i64, String> {
        if lo > hi {
            return Err(format!("between(lo, hi) requires lo <= hi, got {lo}..{hi}"));
        }
        Ok(self.inner.gen_range(lo..=hi))
    }

    /// Draws a uniform `bool`, biased `true` with the given probability in
    /// `[0.0, 1.0]`. Used by constraints that need a coin flip (e.g. whether
    /// to include an optional edge label).
    pub fn flip(&mut self, probability_true: f64) -> bool {
        self.inner.gen_bool(probability_true.clamp(0.0, 1.0))
    }
}

/// Deterministically expands an arbitrary-length seed into the 32 bytes
/// `StdRng::from_seed` requires, mixing in [`SEED_VERSION_TAG`] so that a
/// future incompatible change to this expansion can be made to change every
/// downstream sequence rather than silently reusing old ones.
///
/// This is a splitmix64-style avalanche, not a cryptographic hash: it only
/// needs to turn seed bytes into well-distributed state, not resist
/// adversarial inputs.
fn expand_seed(seed: &[u8]) -> [u8; 32] {
    let mut state = SEED_VERSION_TAG;
    for chunk in seed.chunks(8) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        state ^= u64::from_le_bytes(buf);
        state = splitmix64(state);
    }

    let mut out = [0u8; 32];
    for (i, word) in out.chunks_mut(8).enumerate() {
        state = splitmix64(state.wrapping_add(i as u64 + 1));
        word.copy_from_slice(&state.to_le_bytes());
    }
    out
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = z;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED_A: &[u8] = b"abcde0123456789";

    #[test]
    fn rejects_short_seeds() {
        assert!(Rng::new(b"too-short").is_err());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(SEED_A).unwrap();
        let mut b = Rng::new(SEED_A).unwrap();
        let draws_a: Vec<i64> = (0..50).map(|_| a.between(1, 1_000_000).unwrap()).collect();
        let draws_b: Vec<i64> = (0..50).map(|_| b.between(1, 1_000_000).unwrap()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Rng::new(SEED_A).unwrap();
        let mut b = Rng::new(b"fedcb9876543210").unwrap();
        let draws_a: Vec<i64> = (0..20).map(|_| a.between(0, i64::MAX).unwrap()).collect();
        let draws_b: Vec<i64> = (0..20).map(|_| b.between(0, i64::MAX).unwrap()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn between_is_inclusive_and_bounded() {
        let mut rng = Rng::new(SEED_A).unwrap();
        for _ in 0..200 {
            let v = rng.between(5, 10).unwrap();
            assert!((5..=10).contains(&v));
        }
    }

    #[test]
    fn below_is_half_open() {
        let mut rng = Rng::new(SEED_A).unwrap();
        for _ in 0..200 {
            let v = rng.below(3).unwrap();
            assert!((0..3).contains(&v));
        }
    }

    #[test]
    fn below_rejects_non_positive() {
        let mut rng = Rng::new(SEED_A).unwrap();
        assert!(rng.below(0).is_err());
    }

    #[test]
    fn between_rejects_inverted_range() {
        let mut rng = Rng::new(SEED_A).unwrap();
        assert!(rng.between(10, 5).is_err());
    }
}

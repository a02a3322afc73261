//! Deterministic utilities for reproducible generation and training
//!
//! The LCG drives both the dataset generator (through the float draws
//! `uniform` and `choose`) and forest bootstrap sampling; the row hash orders
//! the validation split and the tie-breaker fixes split selection. Together
//! they make datasets and forests identical across platforms and runs.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    // LCG constants (compatible with glibc)
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: i64) -> Self {
        Self {
            state: Wrapping(seed.wrapping_abs() % Self::MODULUS),
        }
    }

    /// Generate next random i64 in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: i64) -> i64 {
        if max <= 0 {
            return 0;
        }
        self.next_i64() % max
    }

    /// Uniform value in [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        self.next_i64() as f64 / Self::MODULUS as f64
    }

    /// Uniform value in [low, high)
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Pick one element uniformly
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let idx = self.next_range(items.len() as i64) as usize;
        items.get(idx)
    }
}

/// Deterministic xxhash64-like hash in pure i64 arithmetic
/// Simplified version for row ordering
pub fn xxhash64_i64(data: &[i64], seed: i64) -> i64 {
    const PRIME1: i64 = 0x9E3779B185EBCA87_u64 as i64;
    const PRIME2: i64 = 0xC2B2AE3D27D4EB4F_u64 as i64;
    const PRIME3: i64 = 0x165667B19E3779F9_u64 as i64;
    const PRIME5: i64 = 0x85EBCA77C2B2AE63_u64 as i64;

    let mut h = seed.wrapping_add(PRIME5);

    for &val in data {
        h = h.wrapping_add(val.wrapping_mul(PRIME3));
        h = h.rotate_left(17).wrapping_mul(PRIME2);
    }

    h ^= h >> 33;
    h = h.wrapping_mul(PRIME1);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 32;

    h
}

/// Deterministic tie-breaker for split selection
/// Lower (feature_idx, threshold) wins when gains are equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: i64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: i64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_i64(), rng2.next_i64());
        }
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..100 {
            let val = rng.next_range(10);
            assert!((0..10).contains(&val));
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_uniform_bounds() {
        let mut rng = LcgRng::new(7);
        for _ in 0..1000 {
            let v = rng.uniform(-2.0, 2.0);
            assert!((-2.0..2.0).contains(&v));
        }
    }

    #[test]
    fn test_choose() {
        let mut rng = LcgRng::new(3);
        let items = ["Rice", "Wheat", "Maize"];
        let mut seen = [false; 3];
        for _ in 0..100 {
            let pick = rng.choose(&items).copied();
            let idx = items.iter().position(|i| Some(*i) == pick).unwrap_or(usize::MAX);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));

        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }

    #[test]
    fn test_negative_seed() {
        let mut a = LcgRng::new(-42);
        let mut b = LcgRng::new(42);
        assert_eq!(a.next_i64(), b.next_i64());
        assert!(LcgRng::new(i64::MIN).next_i64() >= 0);
    }

    #[test]
    fn test_xxhash64_determinism() {
        let data = vec![1, 2, 3, 4, 5];
        let h1 = xxhash64_i64(&data, 42);
        let h2 = xxhash64_i64(&data, 42);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_xxhash64_different_seeds() {
        let data = vec![1, 2, 3, 4, 5];
        let h1 = xxhash64_i64(&data, 42);
        let h2 = xxhash64_i64(&data, 43);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_tie_breaker_ordering() {
        let t1 = SplitTieBreaker::new(0, 100);
        let t2 = SplitTieBreaker::new(0, 200);
        let t3 = SplitTieBreaker::new(1, 50);

        assert!(t1 < t2);
        assert!(t2 < t3);
    }
}

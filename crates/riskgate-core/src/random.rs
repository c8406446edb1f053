//! Randomness sources for the desensitization coin flip.
//!
//! The flip is the only non-deterministic step in a decision. It goes through
//! [`RandomSource`] so each controller owns its generator and tests can script
//! the outcome.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// `StdRng`-backed source; the default for controllers.
#[derive(Debug, Clone)]
pub struct EntropySource {
    rng: StdRng,
}

impl EntropySource {
    /// Seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible within one build of `rand`; use [`XorShift64`] when draws
    /// must stay stable across dependency upgrades.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for EntropySource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// xorshift64* generator with a stable, portable sequence per seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// A zero seed would lock the generator at zero, so seeds are scrambled
    /// through splitmix64 first.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut state = splitmix64(seed);
        if state == 0 {
            state = 0x9E37_79B9_7F4A_7C15;
        }
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

impl RandomSource for XorShift64 {
    fn next_unit(&mut self) -> f64 {
        // Top 53 bits → [0, 1).
        (self.next_u64() >> 11) as f64 * (1.0 / (1_u64 << 53) as f64)
    }
}

/// Scripted draws, replayed in a cycle. Counts how many draws were taken.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedDraws {
    draws: Vec<f64>,
    next: usize,
    taken: u64,
}

impl FixedDraws {
    /// Cycle through `draws`. An empty script behaves like `always(0.0)`.
    #[must_use]
    pub fn new(draws: Vec<f64>) -> Self {
        let draws = if draws.is_empty() { vec![0.0] } else { draws };
        Self {
            draws,
            next: 0,
            taken: 0,
        }
    }

    /// Every draw returns `value`.
    #[must_use]
    pub fn always(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Every coin flip succeeds.
    #[must_use]
    pub fn always_pass() -> Self {
        Self::always(0.0)
    }

    /// Every coin flip fails.
    #[must_use]
    pub fn always_fail() -> Self {
        Self::always(1.0)
    }

    #[must_use]
    pub fn taken(&self) -> u64 {
        self.taken
    }
}

impl RandomSource for FixedDraws {
    fn next_unit(&mut self) -> f64 {
        let value = self.draws[self.next];
        self.next = (self.next + 1) % self.draws.len();
        self.taken += 1;
        value
    }
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit_draws(source: &mut impl RandomSource) {
        for _ in 0..10_000 {
            let u = source.next_unit();
            assert!((0.0..1.0).contains(&u), "draw {u} escaped [0, 1)");
        }
    }

    #[test]
    fn entropy_draws_are_in_unit_interval() {
        assert_unit_draws(&mut EntropySource::from_entropy());
        assert_unit_draws(&mut EntropySource::seeded(7));
    }

    #[test]
    fn xorshift_draws_are_in_unit_interval() {
        assert_unit_draws(&mut XorShift64::new(0));
        assert_unit_draws(&mut XorShift64::new(0xDEAD_BEEF));
    }

    #[test]
    fn xorshift_is_reproducible_per_seed() {
        let mut a = XorShift64::new(42);
        let mut b = XorShift64::new(42);
        let mut c = XorShift64::new(43);
        let seq_a: Vec<u64> = (0..16).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..16).map(|_| b.next_u64()).collect();
        let seq_c: Vec<u64> = (0..16).map(|_| c.next_u64()).collect();
        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a, seq_c);
    }

    #[test]
    fn seeded_entropy_is_reproducible() {
        let mut a = EntropySource::seeded(9);
        let mut b = EntropySource::seeded(9);
        for _ in 0..32 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn fixed_draws_cycle_and_count() {
        let mut source = FixedDraws::new(vec![0.1, 0.9]);
        assert_eq!(source.next_unit(), 0.1);
        assert_eq!(source.next_unit(), 0.9);
        assert_eq!(source.next_unit(), 0.1);
        assert_eq!(source.taken(), 3);
    }

    #[test]
    fn chance_compares_strictly() {
        let mut pass = FixedDraws::always_pass();
        let mut fail = FixedDraws::always_fail();
        assert!(pass.chance(0.05));
        assert!(!pass.chance(0.0));
        assert!(!fail.chance(0.8));
        assert!(!fail.chance(1.0));
    }

    #[test]
    fn empty_script_falls_back_to_zero() {
        let mut source = FixedDraws::new(Vec::new());
        assert_eq!(source.next_unit(), 0.0);
    }

    #[test]
    fn mutable_references_forward() {
        fn draw<R: RandomSource>(mut source: R) -> f64 {
            source.next_unit()
        }
        let mut source = FixedDraws::always(0.25);
        assert_eq!(draw(&mut source), 0.25);
        assert_eq!(draw(Box::new(&mut source)), 0.25);
        assert_eq!(source.taken(), 2);
    }
}

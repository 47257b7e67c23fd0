//! Deterministic random streams
//!
//! Every random value graphmark produces comes from a [`DeterministicRng`].
//! Streams are seeded ChaCha8, so a seed yields the same sequence on every
//! platform and in every process. Dataset generation and query parameters use
//! separate streams so that one never shifts the other.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed of the dataset generation stream
pub const DATASET_SEED: u64 = 42;

/// Seed of the query parameter stream
pub const QUERY_SEED: u64 = 1337;

/// Seeded, resettable stream of floats in `[0, 1)`
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream used by the dataset generator
    pub fn dataset() -> Self {
        Self::new(DATASET_SEED)
    }

    /// Stream used for query parameters
    pub fn queries() -> Self {
        Self::new(QUERY_SEED)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind to the first value of the stream
    pub fn reset(&mut self) {
        self.inner = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Next float in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in the inclusive range `[min, max]`
    ///
    /// Computed as `floor(x * (max - min + 1)) + min`.
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(min <= max, "empty range {min}..={max}");
        let span = (max - min + 1) as f64;
        (self.next_f64() * span).floor() as i64 + min
    }

    /// Uniform element of a non-empty slice, selected at `floor(x * len)`
    pub fn random_choice<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = (self.next_f64() * items.len() as f64).floor() as usize;
        &items[idx.min(items.len() - 1)]
    }

    /// Uniform id in `[0, count)`, or 0 when `count` is 0
    pub fn random_id(&mut self, count: u64) -> u64 {
        if count == 0 {
            return 0;
        }
        self.random_int(0, count as i64 - 1) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRng::new(7);
        let mut b = DeterministicRng::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_streams_are_pinned() {
        // Fixed across processes and platforms; a change here changes every
        // generated dataset and parameter sequence
        let mut dataset = DeterministicRng::dataset();
        let bits: Vec<u64> = (0..4).map(|_| dataset.next_f64().to_bits()).collect();
        assert_eq!(
            bits,
            [
                0x3fe5_d217_f6a7_2bab,
                0x3fee_68a7_f8c4_af32,
                0x3fdb_5c6d_c231_6d94,
                0x3fe4_1356_5f2b_02cc,
            ]
        );

        let mut queries = DeterministicRng::queries();
        let bits: Vec<u64> = (0..4).map(|_| queries.next_f64().to_bits()).collect();
        assert_eq!(
            bits,
            [
                0x3fe5_704b_693f_02a5,
                0x3fe1_c938_f0cd_5e1e,
                0x3fee_e0c1_234f_127a,
                0x3fe9_07ff_b349_71b4,
            ]
        );
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = DeterministicRng::new(1);
        let mut b = DeterministicRng::new(2);
        let same = (0..100).filter(|_| a.next_f64() == b.next_f64()).count();
        assert!(same < 100);
    }

    #[test]
    fn test_values_in_unit_interval() {
        let mut rng = DeterministicRng::dataset();
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_reset_replays_stream() {
        let mut rng = DeterministicRng::queries();
        let first: Vec<u64> = (0..50).map(|_| rng.next_f64().to_bits()).collect();
        rng.reset();
        let second: Vec<u64> = (0..50).map(|_| rng.next_f64().to_bits()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_int_inclusive_bounds() {
        let mut rng = DeterministicRng::new(99);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..10_000 {
            let v = rng.random_int(3, 6);
            assert!((3..=6).contains(&v));
            seen_min |= v == 3;
            seen_max |= v == 6;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn test_random_choice_covers_all() {
        let mut rng = DeterministicRng::new(5);
        let items = ["a", "b", "c"];
        let mut hits = [0usize; 3];
        for _ in 0..3000 {
            let pick = rng.random_choice(&items);
            let idx = items.iter().position(|i| i == pick).unwrap();
            hits[idx] += 1;
        }
        assert!(hits.iter().all(|&h| h > 0));
    }

    #[test]
    fn test_random_id_empty_population() {
        let mut rng = DeterministicRng::new(5);
        assert_eq!(rng.random_id(0), 0);
        assert!(rng.random_id(10) < 10);
    }
}

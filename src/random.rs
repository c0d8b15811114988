use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of randomness for rollouts.
pub trait RandomGenerator {
    fn next_u64(&mut self) -> u64;

    /// A uniformly distributed value in `from..to`. `to` must be greater than `from`.
    fn next_range(&mut self, from: usize, to: usize) -> usize;

    fn choose<'a, K>(&mut self, items: &'a [K]) -> Option<&'a K> {
        if items.is_empty() {
            None
        } else {
            items.get(self.next_range(0, items.len()))
        }
    }
}

/// Uses the thread-local generator of `rand`, seeded from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRandomGenerator;

impl RandomGenerator for StandardRandomGenerator {
    fn next_u64(&mut self) -> u64 {
        rand::random()
    }

    fn next_range(&mut self, from: usize, to: usize) -> usize {
        rand::rng().random_range(from..to)
    }
}

/// A reproducible generator: equal seeds produce equal sequences.
#[derive(Debug, Clone)]
pub struct SeededRandomGenerator {
    rng: StdRng,
}

impl Default for SeededRandomGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

const DEFAULT_SEED: u64 = 3819201;

impl SeededRandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from `seed` when given, otherwise from the thread-local generator.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(rand::random))
    }
}

impl RandomGenerator for SeededRandomGenerator {
    fn next_u64(&mut self) -> u64 {
        self.rng.random()
    }

    fn next_range(&mut self, from: usize, to: usize) -> usize {
        self.rng.random_range(from..to)
    }
}

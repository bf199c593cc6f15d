// Fast random number generator for per-history sampling
//
// A PCG variant over a 64-bit LCG: minimal state (one u64), fully
// inlineable, and cheap to reseed per photon history. Implements
// rand's RngCore so the sampling code can stay generic over
// `&mut impl Rng`.
//
// Reference: Melissa E. O'Neill, "PCG: A Family of Simple Fast
// Space-Efficient Statistically Good Algorithms for Random Number
// Generation"

use rand::{RngCore, SeedableRng};

/// LCG multiplier
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant
const PRN_ADD: u64 = 1442695040888963407;

/// Fast PCG-LCG random number generator.
#[derive(Clone, Copy, Debug)]
pub struct FastRng {
    seed: u64,
}

impl FastRng {
    /// Create a new FastRng with the given seed
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed an independent stream for one photon history.
    ///
    /// Uses LCG skip-ahead so history N always starts at the same point
    /// in the master sequence regardless of how many samples earlier
    /// histories consumed.
    pub fn for_history(master_seed: u64, history_index: u64) -> Self {
        // Skip ahead by a fixed stride per history (O(log n) doubling)
        const STRIDE: u64 = 152917;
        let mut n = STRIDE.wrapping_mul(history_index);
        let mut seed = master_seed;
        let mut mult = PRN_MULT;
        let mut add = PRN_ADD;
        while n > 0 {
            if n & 1 == 1 {
                seed = mult.wrapping_mul(seed).wrapping_add(add);
            }
            add = mult.wrapping_add(1).wrapping_mul(add);
            mult = mult.wrapping_mul(mult);
            n >>= 1;
        }
        Self { seed }
    }

    /// Generate a random f64 in [0, 1)
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        // Advance the LCG
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);

        // PCG output permutation (RXS-M-XS variant)
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        let result = (word >> 43) ^ word;

        // Convert to f64 in [0, 1) - equivalent to ldexp(result, -64)
        (result as f64) * 5.421010862427522e-20
    }

    /// Reseed the RNG (for reuse across histories)
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            seed: u64::from_le_bytes(seed),
        }
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        // Advance the LCG
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);

        // PCG output permutation
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut left = dest;
        while left.len() >= 8 {
            let bytes = self.next_u64().to_le_bytes();
            left[..8].copy_from_slice(&bytes);
            left = &mut left[8..];
        }
        if !left.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            left.copy_from_slice(&bytes[..left.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

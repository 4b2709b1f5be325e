//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call a platform RNG directly.
//! Each match owns one MatchRng, derived from (master_seed XOR match_id),
//! so a match's play-by-play is fully reproducible from the seed alone
//! and adding concurrent matches never perturbs another match's stream.

use crate::types::MatchId;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

pub struct MatchRng {
    inner: Pcg64Mcg,
}

impl MatchRng {
    /// Derive the RNG for one match from the master seed.
    pub fn for_match(master_seed: u64, match_id: MatchId) -> Self {
        let derived = master_seed ^ (match_id as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self::from_seed(derived)
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly. None on an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.next_u64_below(items.len() as u64) as usize;
        Some(&items[idx])
    }
}

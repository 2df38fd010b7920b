//! Seeded randomness for play resolution.
//!
//! Every play is resolved from a single 64-bit seed. The seed is drawn from a
//! per-channel [`SeedSource`] when the play is enqueued and is recorded in the
//! outcome trace, so any play can be reproduced exactly for debugging or
//! replay.
//!
//! ## Seed derivation
//!
//! ```text
//! stream_key = sha256(master_seed || channel || "prizecast-seed-stream")
//! seed[n]    = ChaCha20(stream_key).next_u64()
//! ```
//!
//! Without a master seed the stream key comes from OS entropy, which keeps
//! live outcomes unpredictable while still recording the per-play seed.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Domain separator for per-channel seed streams.
const SEED_STREAM_DOMAIN: &[u8] = b"prizecast-seed-stream";

/// Deterministic RNG used while resolving a single play.
#[derive(Clone, Debug)]
pub struct PlayRng {
    inner: ChaCha20Rng,
}

impl PlayRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform draw in `[low, high)`. Returns `low` for an empty range.
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        if !(high > low) {
            return low;
        }
        self.inner.gen_range(low..high)
    }
}

/// Source of per-play seeds for one channel.
#[derive(Clone, Debug)]
pub struct SeedSource {
    rng: ChaCha20Rng,
}

impl SeedSource {
    /// Seeds from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Seeds deterministically from a master seed and a stream label
    /// (usually the channel name).
    pub fn derived(master_seed: u64, stream: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(master_seed.to_be_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(SEED_STREAM_DOMAIN);
        let key: [u8; 32] = hasher.finalize().into();
        Self {
            rng: ChaCha20Rng::from_seed(key),
        }
    }

    /// Derived when a master seed is configured, entropy otherwise.
    pub fn for_stream(master_seed: Option<u64>, stream: &str) -> Self {
        match master_seed {
            Some(master) => Self::derived(master, stream),
            None => Self::from_entropy(),
        }
    }

    pub fn next_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_rng_is_deterministic() {
        let mut a = PlayRng::new(7);
        let mut b = PlayRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn test_unit_is_half_open() {
        let mut rng = PlayRng::new(1);
        for _ in 0..10_000 {
            let value = rng.unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_empty_range_returns_low() {
        let mut rng = PlayRng::new(1);
        assert_eq!(rng.range(0.0, 0.0), 0.0);
        assert_eq!(rng.range(2.0, 1.0), 2.0);
    }

    #[test]
    fn test_derived_streams_are_reproducible_and_distinct() {
        let mut a = SeedSource::derived(42, "main");
        let mut b = SeedSource::derived(42, "main");
        let mut c = SeedSource::derived(42, "main#test");
        let first: Vec<u64> = (0..4).map(|_| a.next_seed()).collect();
        let second: Vec<u64> = (0..4).map(|_| b.next_seed()).collect();
        let other: Vec<u64> = (0..4).map(|_| c.next_seed()).collect();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }
}

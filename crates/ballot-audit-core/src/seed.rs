//! Deterministic seed derivation.
//!
//! Every trial owns an RNG substream seeded from `(round_seed, trial_index)`,
//! so results do not depend on execution order or worker count.

use sha2::{Digest, Sha256};

/// Domain separator mixed into round seeds so they never collide with
/// trial seeds derived from the same master seed.
const ROUND_DOMAIN: u64 = 0x726f_756e_6473; // "rounds"

/// SplitMix64 finalizer.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Counter-based seed for substream `counter` of `seed`.
///
/// Adjacent counters yield uncorrelated seeds, which matters because
/// Xoshiro seeded with nearby integers starts out correlated.
#[inline]
pub fn counter_rng_seed(seed: u64, counter: u64) -> u64 {
    mix64(seed ^ mix64(counter.wrapping_add(0x9e37_79b9_7f4a_7c15)))
}

/// Seed for all trials of one audit round.
pub fn round_seed(master_seed: u64, round: u32) -> u64 {
    counter_rng_seed(master_seed ^ ROUND_DOMAIN, round as u64)
}

/// Reduce a ceremony seed string (e.g. concatenated dice rolls) to 64 bits.
///
/// Uses SHA-256 so the value is identical on every platform and process.
pub fn hash_seed_string(seed: &str) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

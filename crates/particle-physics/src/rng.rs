//! Seeded random streams for parallel spawning
//!
//! Each (seed, tick, slot) triple gets its own small generator, so a slot
//! respawned inside a parallel loop never touches shared RNG state and a run
//! replays identically from the same seed.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// SplitMix64 finaliser
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator for one slot at one tick
pub fn slot_rng(seed: u64, tick: u64, slot: usize) -> SmallRng {
    let key = mix(mix(seed) ^ tick.rotate_left(32)) ^ slot as u64;
    SmallRng::seed_from_u64(mix(key))
}

/// Fresh run seed from the thread RNG, used when the caller has no seed
pub fn entropy_seed() -> u64 {
    rand::random()
}

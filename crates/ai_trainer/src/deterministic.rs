//! Deterministic utilities for reproducible training
//!
//! Every random draw in the trainer (split shuffling, bootstrap sampling,
//! feature subsets) comes from the LCG below, so a seed and a dataset fully
//! determine the trained forest.

use std::num::Wrapping;

/// 64-bit Linear Congruential Generator
/// Uses Knuth's MMIX constants; output is taken from the high bits
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: Wrapping(seed),
        };
        // Discard the first output so nearby seeds diverge
        rng.next_u64();
        rng
    }

    /// Next raw state
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0
    }

    /// Next value with 32 bits of entropy from the high half of the state
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Random value in range [0, max)
    pub fn next_below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        let wide = ((self.next_u64() >> 32) << 32) | self.next_u32() as u64;
        (wide % max as u64) as usize
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_below(i + 1);
            items.swap(i, j);
        }
    }
}

/// Derive an independent seed for sub-stream `stream` of `seed`
/// xxhash64-style avalanche over the two inputs
pub fn mix64(seed: u64, stream: u64) -> u64 {
    const PRIME1: u64 = 0x9E3779B185EBCA87;
    const PRIME2: u64 = 0xC2B2AE3D27D4EB4F;
    const PRIME3: u64 = 0x165667B19E3779F9;
    const PRIME5: u64 = 0x85EBCA77C2B2AE63;

    let mut h = seed.wrapping_add(PRIME5);
    h = h.wrapping_add(stream.wrapping_mul(PRIME3));
    h = h.rotate_left(17).wrapping_mul(PRIME2);

    h ^= h >> 33;
    h = h.wrapping_mul(PRIME1);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 32;

    h
}

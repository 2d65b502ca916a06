//! Deterministic bit generators and per-trial seed derivation.
//!
//! Both generators implement `rand::RngCore` + `rand::SeedableRng`, and
//! `seed_from_u64(s)` seeds the native state with `s` directly (no
//! intermediate hashing), so a seed printed in a run manifest reproduces
//! the exact stream.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{RngCore, SeedableRng};

const NN: usize = 312;
const MM: usize = 156;
const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000; // most significant 33 bits
const LOWER_MASK: u64 = 0x0000_0000_7FFF_FFFF; // least significant 31 bits

/// 64-bit Mersenne Twister (MT19937-64).
#[derive(Clone)]
pub struct Mt64 {
    mt: [u64; NN],
    mti: usize,
}

impl Mt64 {
    /// Same default seed as `std::mt19937_64`.
    pub const DEFAULT_SEED: u64 = 5489;

    pub fn new(seed: u64) -> Self {
        let mut mt = [0u64; NN];
        mt[0] = seed;
        for i in 1..NN {
            let prev = mt[i - 1];
            mt[i] = 6364136223846793005u64
                .wrapping_mul(prev ^ (prev >> 62))
                .wrapping_add(i as u64);
        }
        Self { mt, mti: NN }
    }

    fn twist(&mut self) {
        #[inline]
        fn mag(x: u64) -> u64 { if x & 1 == 0 { 0 } else { MATRIX_A } }

        for i in 0..NN - MM {
            let x = (self.mt[i] & UPPER_MASK) | (self.mt[i + 1] & LOWER_MASK);
            self.mt[i] = self.mt[i + MM] ^ (x >> 1) ^ mag(x);
        }
        for i in NN - MM..NN - 1 {
            let x = (self.mt[i] & UPPER_MASK) | (self.mt[i + 1] & LOWER_MASK);
            self.mt[i] = self.mt[i + MM - NN] ^ (x >> 1) ^ mag(x);
        }
        let x = (self.mt[NN - 1] & UPPER_MASK) | (self.mt[0] & LOWER_MASK);
        self.mt[NN - 1] = self.mt[MM - 1] ^ (x >> 1) ^ mag(x);
        self.mti = 0;
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        if self.mti >= NN { self.twist(); }
        let mut x = self.mt[self.mti];
        self.mti += 1;
        // tempering
        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^ (x >> 43)
    }
}

impl Default for Mt64 {
    fn default() -> Self { Self::new(Self::DEFAULT_SEED) }
}

impl fmt::Debug for Mt64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mt64").field("mti", &self.mti).finish_non_exhaustive()
    }
}

impl RngCore for Mt64 {
    #[inline] fn next_u32(&mut self) -> u32 { (Mt64::next_u64(self) >> 32) as u32 }
    #[inline] fn next_u64(&mut self) -> u64 { Mt64::next_u64(self) }
    fn fill_bytes(&mut self, dest: &mut [u8]) { fill_via_u64(self, dest) }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mt64 {
    type Seed = [u8; 8];
    fn from_seed(seed: Self::Seed) -> Self { Self::new(u64::from_le_bytes(seed)) }
    fn seed_from_u64(state: u64) -> Self { Self::new(state) }
}

/// SplitMix64 (tiny, portable, reproducible).
#[derive(Clone, Copy, Debug)]
pub struct SplitMix64 { state: u64 }

impl SplitMix64 {
    pub fn new(seed: u64) -> Self { Self { state: seed } }
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut z = { self.state = self.state.wrapping_add(0x9E3779B97F4A7C15); self.state };
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl RngCore for SplitMix64 {
    #[inline] fn next_u32(&mut self) -> u32 { (SplitMix64::next_u64(self) >> 32) as u32 }
    #[inline] fn next_u64(&mut self) -> u64 { SplitMix64::next_u64(self) }
    fn fill_bytes(&mut self, dest: &mut [u8]) { fill_via_u64(self, dest) }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix64 {
    type Seed = [u8; 8];
    fn from_seed(seed: Self::Seed) -> Self { Self::new(u64::from_le_bytes(seed)) }
    fn seed_from_u64(state: u64) -> Self { Self::new(state) }
}

fn fill_via_u64<R: RngCore + ?Sized>(rng: &mut R, dest: &mut [u8]) {
    for chunk in dest.chunks_mut(8) {
        let bytes = rng.next_u64().to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
}

/// One seed per trial: `base, base + 2, base + 4, ...` (wrapping).
pub fn derive_seeds(base: u64, trials: usize) -> Vec<u64> {
    let mut seeds = Vec::with_capacity(trials);
    let mut s = base;
    for _ in 0..trials {
        seeds.push(s);
        s = s.wrapping_add(2);
    }
    seeds
}

/// Wall-clock seconds since the UNIX epoch, used when no base seed is given.
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

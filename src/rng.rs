//! Deterministic random number generation.
//!
//! Every random decision in the kernel is drawn from a [`Mulberry32`]
//! generator, so a run is fully determined by its seed and the generator's
//! 32-bit state can be persisted and restored mid-run.
//!
//! Mixing constants (fixed, shared with every other implementation of the
//! model so identical seeds reproduce identical sequences):
//!
//! - state increment: `0x6D2B79F5`
//! - round 1: `t = (t ^ (t >> 15)) * (t | 1)`
//! - round 2: `t ^= t + (t ^ (t >> 7)) * (t | 61)`
//! - output: `(t ^ (t >> 14)) / 2^32`
//!
//! All arithmetic is wrapping 32-bit unsigned.

use rand::{Error, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Odd increment added to the state before every draw
pub const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32 generator with an inspectable 32-bit state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Create a generator whose state is exactly `seed`
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Create a generator from a loosely typed numeric seed.
    ///
    /// Non-finite seeds normalize to 0; finite seeds are truncated and
    /// wrapped into the unsigned 32-bit range (see [`normalize_seed`]).
    pub fn from_seed_value(seed: f64) -> Self {
        Self::new(normalize_seed(seed))
    }

    /// Current internal state. Fully determines all future output.
    #[inline]
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Restore a previously captured state
    #[inline]
    pub fn set_state(&mut self, state: u32) {
        self.state = state;
    }

    /// Next float in `[0, 1)`
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        unit(self)
    }

    #[inline]
    fn mix(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl RngCore for Mulberry32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.mix()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_u32());
        let hi = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Draw a float in `[0, 1)` from any generator: one `u32` divided by 2^32.
///
/// This is the only way the kernel turns generator output into a number, so
/// one draw always consumes exactly one `next_u32`.
#[inline]
pub fn unit<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.next_u32()) / TWO_POW_32
}

/// Map an arbitrary numeric seed onto the 32-bit state space.
///
/// NaN and infinities become 0. Finite values are truncated toward zero and
/// reduced modulo 2^32 (so `-1.0` maps to `u32::MAX`).
pub fn normalize_seed(seed: f64) -> u32 {
    if !seed.is_finite() {
        return 0;
    }
    seed.trunc().rem_euclid(TWO_POW_32) as u32
}

/// Independent generator for one cell of one tick in parallel mode.
///
/// The tick seed is drawn once from the run's main generator; each cell then
/// reads from its own ChaCha stream, so results do not depend on thread
/// scheduling.
pub fn derive_cell_rng(tick_seed: u32, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(tick_seed));
    rng.set_stream(index as u64);
    rng
}

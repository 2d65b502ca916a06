use rand::RngCore;

/// Maps one 64-bit draw to a particle index in `[0, n)`.
///
/// `index = floor(n * draw / 2^64)`, computed exactly with a 128-bit
/// multiply-high, so the maximal draw still lands on `n - 1`.
#[derive(Clone, Debug)]
pub struct ParticleSelector<R> {
    rng: R,
    n: usize,
}

impl<R: RngCore> ParticleSelector<R> {
    /// `n >= 2` is checked by `Trial::new`; here only `n > 0` is assumed.
    pub fn new(rng: R, n: usize) -> Self {
        debug_assert!(n > 0, "ParticleSelector needs at least one particle");
        Self { rng, n }
    }

    #[inline] pub fn num_particles(&self) -> usize { self.n }

    #[inline]
    pub fn select(&mut self) -> usize { scale(self.rng.next_u64(), self.n) }
}

#[inline]
pub(crate) fn scale(draw: u64, n: usize) -> usize {
    ((draw as u128 * n as u128) >> 64) as usize
}

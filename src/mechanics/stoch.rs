/// Stochastic mechanics for the hill-climbing tuner.
/// Uses `bevy_prng::WyRand`; callers seed explicitly so runs replay.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

pub fn seeded(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Uniform [0, 1) with 53 bits of precision.
#[inline]
pub fn uniform01(rng: &mut WyRand) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Gaussian(0,1) via Box–Muller.
#[inline]
pub fn gaussian01(rng: &mut WyRand) -> f64 {
    let u1 = uniform01(rng).max(f64::MIN_POSITIVE);
    let u2 = uniform01(rng);
    let r = (-2.0 * u1.ln()).sqrt();
    let t = 2.0 * std::f64::consts::PI * u2;
    r * t.cos()
}

/// Uniform index in 0..n (n > 0).
#[inline]
pub fn index(rng: &mut WyRand, n: usize) -> usize {
    ((uniform01(rng) * n as f64) as usize).min(n.saturating_sub(1))
}

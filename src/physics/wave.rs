//! The wave: a distribution over the five elements plus a magnitude.

use serde::Serialize;

use crate::mechanics::energy::floor_zero;
use crate::symbols::{Branch, Element};

/// Element shares (always summing to 1.0), amplitude (never negative) and
/// accumulated entropy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Wave {
    shares: [f64; 5],
    amplitude: f64,
    entropy: f64,
}

impl Wave {
    pub fn one_hot(e: Element, amplitude: f64) -> Self {
        let mut shares = [0.0; 5];
        shares[e.index()] = 1.0;
        Self { shares, amplitude: floor_zero(amplitude), entropy: 0.0 }
    }

    /// Hidden-stem composition of a branch, weighted by core ratios.
    pub fn from_branch(b: Branch, amplitude: f64) -> Self {
        let mut shares = [0.0; 5];
        for (stem, w) in b.hidden() {
            shares[stem.element().index()] += w;
        }
        let mut w = Self { shares, amplitude: floor_zero(amplitude), entropy: 0.0 };
        w.normalize();
        w
    }

    #[inline]
    pub fn shares(&self) -> &[f64; 5] {
        &self.shares
    }

    #[inline]
    pub fn share(&self, e: Element) -> f64 {
        self.shares[e.index()]
    }

    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    #[inline]
    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Largest share; ties resolve to the earlier element.
    pub fn dominant(&self) -> Element {
        let mut best = 0;
        for i in 1..5 {
            if self.shares[i] > self.shares[best] {
                best = i;
            }
        }
        Element::from_index(best)
    }

    /// Energy per element: amplitude × share.
    pub fn energy(&self) -> [f64; 5] {
        self.shares.map(|s| s * self.amplitude)
    }

    pub fn set_amplitude(&mut self, a: f64) {
        self.amplitude = floor_zero(a);
    }

    pub fn add_amplitude(&mut self, d: f64) {
        self.amplitude = floor_zero(self.amplitude + d);
    }

    pub fn scale(&mut self, f: f64) {
        self.amplitude = floor_zero(self.amplitude * f);
    }

    pub fn add_entropy(&mut self, d: f64) {
        self.entropy = floor_zero(self.entropy + d);
    }

    /// Blend toward a one-hot `target`: shares ← (1-s)·shares + s·δ(target).
    pub fn collapse_toward(&mut self, target: Element, strength: f64) {
        let s = strength.clamp(0.0, 1.0);
        for (i, v) in self.shares.iter_mut().enumerate() {
            let hot = if i == target.index() { 1.0 } else { 0.0 };
            *v = (1.0 - s) * *v + s * hot;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        for v in self.shares.iter_mut() {
            *v = floor_zero(*v);
        }
        let sum: f64 = self.shares.iter().sum();
        if sum > 0.0 {
            for v in self.shares.iter_mut() {
                *v /= sum;
            }
        } else {
            self.shares = [0.2; 5];
        }
    }

    #[inline]
    pub fn share_sum(&self) -> f64 {
        self.shares.iter().sum()
    }
}

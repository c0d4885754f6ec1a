/*!
`qi_field` — a deterministic four-pillar energy field kernel.

What it does
- Turns a natal chart (four stem/branch pillars) plus an optional dynamic
  context (luck cycle, annual pillar) into career / wealth / relationship
  scores in 0..100.
- Models every symbol as a particle carrying a five-element wave, detects
  branch interactions, propagates energy through rooting and the
  generation cycle, and layers pluggable scoring engines on top.
- Runs a closed calibration loop that tunes config tunables against
  labelled cases: `simulate : Θ→D`, `measure : D→Π`, `update : Θ×Π→Θ`,
  composed by [`refine_det`].

How to use (call surface only)
- Build an [`analysis::Analyzer`] from a [`Config`] (defaults or JSON).
- Call `compute(&chart, ctx, carried_health)`; feed the returned health
  map back into the next call to carry damage across passes.
- For tuning, load cases with `calibration::load_cases` and run
  `calibration::Tuner::fit`.

What it does NOT do
- No calendar conversion, no text generation, no persistence. Chart
  symbols and luck cycles come from the caller.
*/

pub mod error;
pub mod config;
pub mod symbols;
pub mod chart;
pub mod mechanics;
pub mod physics;
pub mod systems;
pub mod score;
pub mod analysis;
#[cfg(feature = "calibration")]
pub mod calibration;

pub use analysis::{Analysis, Analyzer};
pub use chart::{Chart, DynamicContext, Pillar, PillarPair};
pub use config::Config;
pub use error::{Error, Result};
pub use symbols::{Branch, Element, Polarity, Stem};
pub use systems::sdk::{Icon, ScoreBundle};

/// Deterministic refinement: θ_{t+1} = update(θ_t, measure(simulate(θ_t))).
///
/// Stops early once `converged(θ_t, θ_{t+1})` holds and returns θ_{t+1};
/// otherwise returns θ after `max_iters` steps.
pub fn refine_det<P, D, M, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> P
where
    Sim: FnMut(&P) -> D,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &P) -> bool,
{
    for _ in 0..max_iters {
        let data = simulate(&theta);
        let pi = measure(&data);
        let theta_next = update(&theta, &pi);
        if converged(&theta, &theta_next) {
            return theta_next;
        }
        theta = theta_next;
    }
    theta
}

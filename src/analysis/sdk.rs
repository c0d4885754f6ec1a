// src/analysis/sdk.rs

//! # Pass SDK
//!
//! Glue for running the analyzer over a *sequence* of dynamic contexts
//! (consecutive years, alternative luck cycles, ...).
//!
//! Every pass is a pure function of its inputs. The only thing that
//! survives from one pass to the next is the particle health map, and it is
//! threaded explicitly: each step receives the previous pass's map and
//! returns the one the next pass should see. Nothing is cached inside the
//! analyzer between calls.

use crate::physics::HealthMap;

/// Standard multi-pass loop. Each `step` gets the pass index and the
/// carried health, and returns the updated health plus its output.
pub fn run_with_outer_iters<F, T>(
    mut health: HealthMap,
    passes: usize,
    mut step: F,
) -> (HealthMap, Vec<T>)
where
    F: FnMut(usize, HealthMap) -> (HealthMap, T),
{
    let mut outs = Vec::with_capacity(passes);
    for k in 0..passes {
        let (next, out) = step(k, health);
        health = next;
        outs.push(out);
    }
    (health, outs)
}

// src/systems/sdk.rs

//! # Engines SDK
//!
//! Protocol for **sub-engines**: self-contained rule layers (vaults,
//! punishments, harmony, ...) that read the same chart and dynamic context
//! as the physics core and hand back score deltas for the aggregator.
//!
//! ## When to create a new engine
//! Create an engine when a rule family can be scored in isolation from
//! the particle simulation, with a clear input (chart symbols, annual and
//! luck pillars, day-master strength) and a clear output (domain deltas,
//! an icon, tags). Examples:
//! - **treasury**: vault opening / tomb collapse on an annual key
//! - **skull**: punishment groups, self-punishment, clash and harm density
//! - **harmony**: fusion (trine, combination) vs fission (clash) on the
//!   annual branch, plus stem five-combinations
//!
//! ## Your responsibilities (per engine)
//! 1) **new(&Config)**: copy the section you need. Engines never hold the
//!    whole tree and never mutate it; reconfiguring rebuilds them.
//! 2) **evaluate(&EngineInput) -> EngineReport**: pure. Same input, same
//!    report; no interior state across calls.
//!
//! ## Determinism & purity
//! - No randomness, no I/O. Logging through `tracing` is fine.
//! - Absent symbols mean "rule cannot fire", never an error.
//!
//! ## Feature flags & reuse
//! - Keep engines under `src/systems/*` and gate with `feature = "engine-*"`.
//! - Engines do not import each other; the analyzer composes them.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use crate::chart::{Chart, PillarPair};
use crate::symbols::Branch;

/// Career / wealth / relationship triple, used both for scores and deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub career: f64,
    pub wealth: f64,
    pub relationship: f64,
}

impl ScoreBundle {
    pub const ZERO: ScoreBundle = ScoreBundle { career: 0.0, wealth: 0.0, relationship: 0.0 };

    pub fn new(career: f64, wealth: f64, relationship: f64) -> Self {
        Self { career, wealth, relationship }
    }

    pub fn sum(&self) -> f64 {
        self.career + self.wealth + self.relationship
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.career), f(self.wealth), f(self.relationship))
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.career, self.wealth, self.relationship]
    }
}

impl Add for ScoreBundle {
    type Output = ScoreBundle;
    fn add(self, o: ScoreBundle) -> ScoreBundle {
        ScoreBundle::new(
            self.career + o.career,
            self.wealth + o.wealth,
            self.relationship + o.relationship,
        )
    }
}

impl AddAssign for ScoreBundle {
    fn add_assign(&mut self, o: ScoreBundle) {
        *self = *self + o;
    }
}

impl Mul<f64> for ScoreBundle {
    type Output = ScoreBundle;
    fn mul(self, k: f64) -> ScoreBundle {
        self.map(|v| v * k)
    }
}

/// Top-level markers. Lower `priority()` wins; `Skull` overrides all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Skull,
    Tomb,
    Trophy,
    Warning,
    Lightning,
    Key,
    Handshake,
}

impl Icon {
    pub fn priority(self) -> u8 {
        match self {
            Icon::Skull => 0,
            Icon::Tomb => 1,
            Icon::Trophy => 2,
            Icon::Warning => 3,
            Icon::Lightning => 4,
            Icon::Key => 5,
            Icon::Handshake => 6,
        }
    }

    /// The more urgent of two optional icons.
    pub fn most_urgent(a: Option<Icon>, b: Option<Icon>) -> Option<Icon> {
        match (a, b) {
            (Some(x), Some(y)) => Some(if y.priority() < x.priority() { y } else { x }),
            (x, None) => x,
            (None, y) => y,
        }
    }
}

/// What every engine sees.
#[derive(Clone, Copy, Debug)]
pub struct EngineInput<'a> {
    pub chart: &'a Chart,
    pub luck: Option<PillarPair>,
    pub annual: Option<PillarPair>,
    /// Verdict of the aggregator's strength classification.
    pub day_master_strong: bool,
}

impl<'a> EngineInput<'a> {
    pub fn new(chart: &'a Chart) -> Self {
        Self { chart, luck: None, annual: None, day_master_strong: false }
    }

    pub fn annual_branch(&self) -> Option<Branch> {
        self.annual.and_then(|p| p.branch)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EngineReport {
    pub engine: &'static str,
    pub deltas: ScoreBundle,
    pub icon: Option<Icon>,
    pub tags: Vec<String>,
}

impl EngineReport {
    pub fn empty(engine: &'static str) -> Self {
        Self { engine, ..Default::default() }
    }
}

/// A rule layer scored next to the physics core.
pub trait Engine {
    fn name(&self) -> &'static str;

    fn evaluate(&self, input: &EngineInput<'_>) -> EngineReport;
}

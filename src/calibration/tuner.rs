//! # Auto-tuner
//!
//! Numeric local search over a vector of config tunables addressed by dotted
//! path (`"structure.clash_loss"`). Every iteration is one [`refine_det`]
//! step:
//!
//! - **simulate**: probe the error surface around θ. Finite difference
//!   scores two perturbed configs per coordinate; hill climbing scores one
//!   seeded random trial.
//! - **measure**: turn the probes into a proposed next θ.
//! - **update**: score the proposal, fold it into the best-so-far and count
//!   stalled iterations.
//!
//! The reported error is the best seen so far, so the history is
//! non-increasing. Running out of iterations is a normal outcome
//! (`converged = false`) and still returns the best parameters found.
//!
//! Evaluation is sequential; every case is scored from a fresh analyzer with
//! no carried health.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::Analyzer;
use crate::calibration::dataset::CalibrationCase;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mechanics::{
    central_difference, gaussian01, index, p_against_error, ratio, relative_step, seeded,
};
use crate::refine_det;
use crate::systems::sdk::ScoreBundle;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TunableParam {
    pub path: String,
    /// Strictly positive lower bound, for multiplicative weights.
    #[serde(default)]
    pub floor: Option<f64>,
}

/// Ordered list of tunables; θ is indexed in this order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpace {
    params: Vec<TunableParam>,
}

impl ParamSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, path: &str) -> Self {
        self.params.push(TunableParam { path: path.to_string(), floor: None });
        self
    }

    pub fn floored(mut self, path: &str, floor: f64) -> Self {
        self.params.push(TunableParam { path: path.to_string(), floor: Some(floor) });
        self
    }

    pub fn params(&self) -> &[TunableParam] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Current values of every tunable in `cfg`.
    pub fn read(&self, cfg: &Config) -> Result<Vec<f64>> {
        self.params.iter().map(|p| cfg.get(&p.path)).collect()
    }

    /// Copy of `base` with θ written into it.
    pub fn apply(&self, base: &Config, theta: &[f64]) -> Result<Config> {
        if theta.len() != self.len() {
            return Err(Error::DimensionMismatch { expected: self.len(), got: theta.len() });
        }
        let updates: Vec<(&str, f64)> = self
            .params
            .iter()
            .zip(theta)
            .map(|(p, &v)| (p.path.as_str(), v))
            .collect();
        base.set_many(&updates)
    }

    fn clamp(&self, i: usize, x: f64) -> f64 {
        match self.params[i].floor {
            Some(f) => x.max(f),
            None => x,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Config("parameter space is empty".into()));
        }
        for p in &self.params {
            if let Some(f) = p.floor {
                if !(f.is_finite() && f > 0.0) {
                    return Err(Error::Config(format!(
                        "floor for `{}` must be strictly positive, got {f}",
                        p.path
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Aggregate error over every domain score of every case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Mae,
    Rmse,
}

impl Objective {
    /// `(predicted, expected)` pairs; zero when there are none.
    pub fn error<I>(self, pairs: I) -> f64
    where
        I: IntoIterator<Item = (ScoreBundle, ScoreBundle)>,
    {
        let mut acc = 0.0;
        let mut n = 0usize;
        for (pred, exp) in pairs {
            for (p, e) in pred.as_array().into_iter().zip(exp.as_array()) {
                let d = p - e;
                acc += match self {
                    Objective::Mae => d.abs(),
                    Objective::Rmse => d * d,
                };
                n += 1;
            }
        }
        let mean = ratio(acc, n as f64);
        match self {
            Objective::Mae => mean,
            Objective::Rmse => mean.sqrt(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Strategy {
    /// Symmetric difference per coordinate, step against the gradient.
    #[default]
    FiniteDifference,
    /// Perturb one random coordinate per iteration, keep it if better.
    /// `step` scales a unit gaussian relative to the coordinate's magnitude.
    HillClimb { seed: u64, step: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    pub learning_rate: f64,
    /// Relative finite-difference step.
    pub epsilon: f64,
    pub min_improvement: f64,
    /// Stalled iterations in a row before declaring convergence.
    pub patience: usize,
    pub objective: Objective,
    pub strategy: Strategy,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epsilon: 1e-3,
            min_improvement: 1e-4,
            patience: 3,
            objective: Objective::Mae,
            strategy: Strategy::FiniteDifference,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FitReport {
    /// Best θ, paired with its paths.
    pub params: Vec<(String, f64)>,
    /// `base` with the best θ applied.
    pub config: Config,
    pub initial_error: f64,
    pub best_error: f64,
    /// Best-so-far error after each iteration.
    pub history: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl FitReport {
    pub fn value(&self, path: &str) -> Option<f64> {
        self.params.iter().find(|(p, _)| p == path).map(|&(_, v)| v)
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Search state threaded through refine_det
────────────────────────────────────────────────────────────────────────── */

#[derive(Clone, Debug)]
struct Search {
    theta: Vec<f64>,
    error: f64,
    best: Vec<f64>,
    best_error: f64,
    stale: usize,
    iteration: usize,
    history: Vec<f64>,
}

/// simulate output
struct Probe {
    theta: Vec<f64>,
    error: f64,
    gradient: Vec<f64>,
    trial: Option<(Vec<f64>, f64)>,
}

/// measure output
struct Proposal {
    next: Vec<f64>,
    next_error: Option<f64>,
}

pub struct Tuner {
    space: ParamSpace,
    cfg: TunerConfig,
}

impl Tuner {
    pub fn new(space: ParamSpace, cfg: TunerConfig) -> Self {
        Self { space, cfg }
    }

    pub fn space(&self) -> &ParamSpace {
        &self.space
    }

    /// Aggregate error of `cfg` over `cases`.
    pub fn evaluate(&self, cfg: Config, cases: &[CalibrationCase]) -> f64 {
        let analyzer = Analyzer::new(cfg);
        self.cfg.objective.error(cases.iter().map(|c| {
            let a = analyzer.compute(&c.chart, c.context.as_ref(), None);
            (a.scores, c.expected)
        }))
    }

    fn error_at(&self, base: &Config, cases: &[CalibrationCase], theta: &[f64]) -> f64 {
        match self.space.apply(base, theta) {
            Ok(cfg) => self.evaluate(cfg, cases),
            Err(err) => {
                warn!(%err, "unscorable parameter vector");
                f64::INFINITY
            }
        }
    }

    /// Fit starting from the values already in `base`.
    pub fn fit_from(
        &self,
        cases: &[CalibrationCase],
        base: &Config,
        max_iterations: usize,
    ) -> Result<FitReport> {
        let initial = self.space.read(base)?;
        self.fit(cases, base, &initial, max_iterations)
    }

    pub fn fit(
        &self,
        cases: &[CalibrationCase],
        base: &Config,
        initial: &[f64],
        max_iterations: usize,
    ) -> Result<FitReport> {
        if cases.is_empty() {
            return Err(Error::EmptyDataset);
        }
        self.space.validate()?;
        if initial.len() != self.space.len() {
            return Err(Error::DimensionMismatch { expected: self.space.len(), got: initial.len() });
        }
        let theta0: Vec<f64> = initial
            .iter()
            .enumerate()
            .map(|(i, &x)| self.space.clamp(i, x))
            .collect();
        // Surfaces bad paths before the loop starts.
        let cfg0 = self.space.apply(base, &theta0)?;
        let error0 = self.evaluate(cfg0, cases);
        info!(
            params = self.space.len(),
            cases = cases.len(),
            error = error0,
            "tuner start"
        );

        let start = Search {
            theta: theta0.clone(),
            error: error0,
            best: theta0,
            best_error: error0,
            stale: 0,
            iteration: 0,
            history: Vec::with_capacity(max_iterations.min(1024)),
        };

        let simulate = |s: &Search| self.probe(base, cases, s);
        let measure = |p: &Probe| self.propose(p);
        let update = |s: &Search, m: &Proposal| self.advance(base, cases, s, m);
        let patience = self.cfg.patience;
        let converged = |_: &Search, next: &Search| next.stale >= patience;

        let end = refine_det(start, simulate, measure, update, converged, max_iterations);
        let done = end.stale >= patience;
        info!(
            iterations = end.iteration,
            best_error = end.best_error,
            converged = done,
            "tuner finished"
        );

        let config = self.space.apply(base, &end.best)?;
        let params = self
            .space
            .params
            .iter()
            .map(|p| p.path.clone())
            .zip(end.best.iter().copied())
            .collect();
        Ok(FitReport {
            params,
            config,
            initial_error: error0,
            best_error: end.best_error,
            history: end.history,
            iterations: end.iteration,
            converged: done,
        })
    }

    fn probe(&self, base: &Config, cases: &[CalibrationCase], s: &Search) -> Probe {
        let n = s.theta.len();
        let mut probe = Probe {
            theta: s.theta.clone(),
            error: s.error,
            gradient: vec![0.0; n],
            trial: None,
        };
        match self.cfg.strategy {
            Strategy::FiniteDifference => {
                let mut shifted = s.theta.clone();
                for i in 0..n {
                    let x = s.theta[i];
                    let h = relative_step(x, self.cfg.epsilon);
                    shifted[i] = x + h;
                    let up = self.error_at(base, cases, &shifted);
                    shifted[i] = x - h;
                    let down = self.error_at(base, cases, &shifted);
                    shifted[i] = x;
                    probe.gradient[i] = if up.is_finite() && down.is_finite() {
                        central_difference(up, down, h)
                    } else {
                        0.0
                    };
                }
                debug!(iteration = s.iteration, gradient = ?probe.gradient, "fd probe");
            }
            Strategy::HillClimb { seed, step } => {
                let mut rng =
                    seeded(seed ^ (s.iteration as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                let i = index(&mut rng, n);
                let x = s.theta[i];
                let mut trial = s.theta.clone();
                trial[i] = self.space.clamp(i, x + step * gaussian01(&mut rng) * x.abs().max(1.0));
                let e = self.error_at(base, cases, &trial);
                debug!(iteration = s.iteration, coord = i, error = e, "hill-climb trial");
                probe.trial = Some((trial, e));
            }
        }
        probe
    }

    fn propose(&self, p: &Probe) -> Proposal {
        match &p.trial {
            Some((trial, e)) if *e < p.error => {
                Proposal { next: trial.clone(), next_error: Some(*e) }
            }
            Some(_) => Proposal { next: p.theta.clone(), next_error: Some(p.error) },
            None => {
                let next = p
                    .theta
                    .iter()
                    .zip(&p.gradient)
                    .enumerate()
                    .map(|(i, (&x, &g))| {
                        let lo = self.space.params[i].floor.unwrap_or(f64::NEG_INFINITY);
                        p_against_error(x, g, self.cfg.learning_rate, lo, f64::INFINITY)
                    })
                    .collect();
                Proposal { next, next_error: None }
            }
        }
    }

    fn advance(
        &self,
        base: &Config,
        cases: &[CalibrationCase],
        s: &Search,
        m: &Proposal,
    ) -> Search {
        let error = m
            .next_error
            .unwrap_or_else(|| self.error_at(base, cases, &m.next));
        let mut next = s.clone();
        next.theta = m.next.clone();
        next.error = error;
        next.iteration += 1;

        let improvement = if error < s.best_error {
            next.best = m.next.clone();
            next.best_error = error;
            s.best_error - error
        } else {
            0.0
        };
        next.stale = if improvement < self.cfg.min_improvement { s.stale + 1 } else { 0 };
        next.history.push(next.best_error);
        info!(
            iteration = next.iteration,
            error,
            best_error = next.best_error,
            stale = next.stale,
            "tuner step"
        );
        next
    }
}

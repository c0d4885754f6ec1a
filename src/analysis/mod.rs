//! Analyzer: wires the particle model, detector, propagator, engines and
//! aggregator into one deterministic pass.
//!
//! The analyzer owns its [`Config`] and the engines built from it.
//! Reconfiguring swaps in a new config value and rebuilds the engines; no
//! component ever mutates the tree in place.

pub mod sdk;
#[cfg(feature = "engine-luck")]
pub mod timeline;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::chart::{Chart, DynamicContext};
use crate::config::Config;
use crate::error::Result;
use crate::physics::{
    self, DisabledRules, ElementSpectrum, HealthMap, InteractionEvent, ParticleState,
    PropagationTrace,
};
use crate::score::{self, Outlook, RelationEnergies, RoleEnergies, RuleOutcome, Strength};
use crate::systems::engines_from;
use crate::systems::sdk::{Engine, EngineInput, EngineReport, Icon, ScoreBundle};

/// Everything one pass produces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub scores: ScoreBundle,
    pub spectrum: ElementSpectrum,
    pub events: Vec<InteractionEvent>,
    pub particles: Vec<ParticleState>,
    /// Feed back as `carried` on the next pass.
    pub health: HealthMap,
    pub roles: RoleEnergies,
    pub relations: RelationEnergies,
    pub strength: Strength,
    pub icon: Option<Icon>,
    pub outlook: Outlook,
    pub reports: Vec<EngineReport>,
    pub rules: RuleOutcome,
    pub trace: PropagationTrace,
}

impl Analysis {
    pub fn particle(&self, id: &str) -> Option<&ParticleState> {
        self.particles.iter().find(|p| p.id == id)
    }

    pub fn report(&self, engine: &str) -> Option<&EngineReport> {
        self.reports.iter().find(|r| r.engine == engine)
    }
}

pub struct Analyzer {
    config: Config,
    engines: Vec<Box<dyn Engine>>,
    disabled: DisabledRules,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        let engines = engines_from(&config);
        Self { config, engines, disabled: DisabledRules::new() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Suppress the numeric effect of the given interaction rule keys.
    pub fn with_disabled_rules<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Merge `overrides` into the current tree and rebuild the engines.
    pub fn reconfigure(&mut self, overrides: &Value) -> Result<()> {
        let next = self.config.merged(overrides)?;
        self.install(next);
        Ok(())
    }

    /// Replace one sub-engine's section and rebuild the engines.
    pub fn replace_section(&mut self, name: &str, section: Value) -> Result<()> {
        let next = self.config.with_section(name, section)?;
        self.install(next);
        Ok(())
    }

    fn install(&mut self, config: Config) {
        self.engines = engines_from(&config);
        self.config = config;
        debug!(engines = self.engines.len(), "analyzer reconfigured");
    }

    /// One full pass. Never fails: absent symbols contribute nothing.
    pub fn compute(
        &self,
        chart: &Chart,
        ctx: Option<&DynamicContext>,
        carried: Option<&HealthMap>,
    ) -> Analysis {
        let cfg = &self.config;

        let mut particles = physics::build(chart, ctx, carried, cfg);
        let events = physics::detect(&mut particles, cfg, &self.disabled);
        let trace = physics::propagate(&mut particles, cfg);
        let health = physics::settle_health(&mut particles, cfg);

        let dm = chart.day_master();
        let roles = dm
            .map(|dm| {
                RoleEnergies::from_particles(&particles, dm, &cfg.macro_env.element_modifiers)
            })
            .unwrap_or_default();
        let relations = roles.relations();
        let strength = score::strength(&relations, cfg);

        let input = EngineInput {
            chart,
            luck: ctx.and_then(|c| c.luck),
            annual: ctx.and_then(|c| c.annual),
            day_master_strong: strength.strong,
        };
        let reports: Vec<EngineReport> = self.engines.iter().map(|e| e.evaluate(&input)).collect();
        let card = score::aggregate(&relations, dm.map(|s| s.element()), &reports, cfg);

        Analysis {
            scores: card.scores,
            spectrum: trace.spectrum,
            events,
            particles: particles.iter().map(ParticleState::from).collect(),
            health,
            roles,
            relations,
            strength,
            icon: card.icon,
            outlook: card.outlook,
            reports,
            rules: card.rules,
            trace,
        }
    }

    /// Run one pass per context, threading health from each pass into the
    /// next. Returns the final health map and every pass's analysis.
    pub fn run_passes(
        &self,
        chart: &Chart,
        contexts: &[DynamicContext],
        carried: HealthMap,
    ) -> (HealthMap, Vec<Analysis>) {
        sdk::run_with_outer_iters(carried, contexts.len(), |k, health| {
            let a = self.compute(chart, Some(&contexts[k]), Some(&health));
            (a.health.clone(), a)
        })
    }
}

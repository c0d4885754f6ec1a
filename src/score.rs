//! Score aggregator: element energy → ten relational roles → domain scores.
//!
//! Roles are read relative to the day master. Domain scores are a linear
//! baseline over the five relations plus engine deltas, followed by the
//! structure rules in a fixed order (mutiny, control conversion, wealth
//! burden, robbery). Later rules may exempt what earlier ones set up.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::{Config, RelationWeights, RuleConfig};
use crate::mechanics::energy::ratio;
use crate::physics::Particle;
use crate::symbols::{Element, Polarity, Stem};
use crate::systems::sdk::{EngineReport, Icon, ScoreBundle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    #[serde(rename = "self")]
    Same,
    Output,
    Wealth,
    Authority,
    Resource,
}

impl Relation {
    /// How `other` relates to the day-master element `dm`.
    pub fn between(dm: Element, other: Element) -> Relation {
        if other == dm {
            Relation::Same
        } else if dm.generates() == other {
            Relation::Output
        } else if dm.destroys() == other {
            Relation::Wealth
        } else if other.destroys() == dm {
            Relation::Authority
        } else {
            Relation::Resource
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Peer,
    RobWealth,
    EatingGod,
    HurtingOfficer,
    IndirectWealth,
    DirectWealth,
    SevenKillings,
    DirectOfficer,
    IndirectResource,
    DirectResource,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Peer,
        Role::RobWealth,
        Role::EatingGod,
        Role::HurtingOfficer,
        Role::IndirectWealth,
        Role::DirectWealth,
        Role::SevenKillings,
        Role::DirectOfficer,
        Role::IndirectResource,
        Role::DirectResource,
    ];

    /// Same polarity as the day master takes the first variant.
    pub fn of(dm: Stem, element: Element, polarity: Polarity) -> Role {
        let same = polarity == dm.polarity();
        match (Relation::between(dm.element(), element), same) {
            (Relation::Same, true) => Role::Peer,
            (Relation::Same, false) => Role::RobWealth,
            (Relation::Output, true) => Role::EatingGod,
            (Relation::Output, false) => Role::HurtingOfficer,
            (Relation::Wealth, true) => Role::IndirectWealth,
            (Relation::Wealth, false) => Role::DirectWealth,
            (Relation::Authority, true) => Role::SevenKillings,
            (Relation::Authority, false) => Role::DirectOfficer,
            (Relation::Resource, true) => Role::IndirectResource,
            (Relation::Resource, false) => Role::DirectResource,
        }
    }

    pub fn relation(self) -> Relation {
        match self {
            Role::Peer | Role::RobWealth => Relation::Same,
            Role::EatingGod | Role::HurtingOfficer => Relation::Output,
            Role::IndirectWealth | Role::DirectWealth => Relation::Wealth,
            Role::SevenKillings | Role::DirectOfficer => Relation::Authority,
            Role::IndirectResource | Role::DirectResource => Relation::Resource,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Peer => "peer",
            Role::RobWealth => "rob_wealth",
            Role::EatingGod => "eating_god",
            Role::HurtingOfficer => "hurting_officer",
            Role::IndirectWealth => "indirect_wealth",
            Role::DirectWealth => "direct_wealth",
            Role::SevenKillings => "seven_killings",
            Role::DirectOfficer => "direct_officer",
            Role::IndirectResource => "indirect_resource",
            Role::DirectResource => "direct_resource",
        }
    }
}

/// Energy per role, indexed in [`Role::ALL`] order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoleEnergies(pub [f64; 10]);

impl RoleEnergies {
    /// Sum particle energy into roles. Each particle's element shares keep
    /// the polarity of its own symbol; `modifiers` scale each element.
    pub fn from_particles(particles: &[Particle], dm: Stem, modifiers: &[f64; 5]) -> Self {
        let mut acc = [0.0; 10];
        for p in particles {
            let pol = p.token.polarity();
            for e in Element::ALL {
                let energy = p.wave.share(e) * p.amplitude() * modifiers[e.index()];
                acc[Role::of(dm, e, pol) as usize] += energy;
            }
        }
        Self(acc)
    }

    #[inline]
    pub fn get(&self, r: Role) -> f64 {
        self.0[r as usize]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn relations(&self) -> RelationEnergies {
        let mut r = RelationEnergies::default();
        for role in Role::ALL {
            let v = self.get(role);
            match role.relation() {
                Relation::Same => r.same += v,
                Relation::Output => r.output += v,
                Relation::Wealth => r.wealth += v,
                Relation::Authority => r.authority += v,
                Relation::Resource => r.resource += v,
            }
        }
        r
    }
}

impl Serialize for RoleEnergies {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut m = s.serialize_map(Some(10))?;
        for r in Role::ALL {
            m.serialize_entry(r.name(), &self.get(r))?;
        }
        m.end()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RelationEnergies {
    #[serde(rename = "self")]
    pub same: f64,
    pub output: f64,
    pub wealth: f64,
    pub authority: f64,
    pub resource: f64,
}

impl RelationEnergies {
    pub fn total(&self) -> f64 {
        self.same + self.output + self.wealth + self.authority + self.resource
    }

    fn weighted(&self, w: &RelationWeights) -> f64 {
        self.same * w.self_
            + self.output * w.output
            + self.wealth * w.wealth
            + self.authority * w.authority
            + self.resource * w.resource
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Strength {
    pub ratio: f64,
    pub strong: bool,
}

/// (self + resource) / total, zero when there is no energy at all.
pub fn strength(rel: &RelationEnergies, cfg: &Config) -> Strength {
    let r = ratio(rel.same + rel.resource, rel.total());
    Strength { ratio: r, strong: r >= cfg.score.strong_threshold }
}

pub fn base_scores(rel: &RelationEnergies, cfg: &Config) -> ScoreBundle {
    let s = &cfg.score;
    ScoreBundle::new(
        s.baseline + rel.weighted(&s.career),
        s.baseline + rel.weighted(&s.wealth),
        s.baseline + rel.weighted(&s.relationship),
    )
}

/* ──────────────────────────────────────────────────────────────────────────
Structure rules
────────────────────────────────────────────────────────────────────────── */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exemption {
    Mediation,
    PartialMediation,
    Shield,
    Alliance,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Robbery {
    /// Share of the full penalty that survived the exemption ladder.
    pub factor: f64,
    pub exemptions: Vec<Exemption>,
    pub wealth_penalty: f64,
    pub relationship_penalty: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub mutiny: bool,
    pub conversion: bool,
    pub burden: bool,
    pub robbery: Option<Robbery>,
    pub deltas: ScoreBundle,
}

/// Apply the four structure rules in order.
pub fn apply_rules(
    rel: &RelationEnergies,
    dm_element: Option<Element>,
    rc: &RuleConfig,
) -> RuleOutcome {
    let mut out = RuleOutcome::default();
    let output_strong = rel.output > rc.mutiny_output_above;
    let authority_strong = rel.authority > rc.mutiny_authority_above;

    // (a) a weak self cannot stop output from attacking authority
    if rel.same < rc.mutiny_self_below && output_strong && authority_strong {
        out.mutiny = true;
        out.deltas.career -= rc.mutiny_penalty;
    }

    // (b) a strong self lets output tame authority
    if !out.mutiny && rel.same > rc.conversion_self_above && output_strong && authority_strong {
        out.conversion = true;
        out.deltas.career += rc.conversion_bonus;
    }

    // (c)
    if rel.same < rc.burden_self_below && rel.wealth > rc.burden_wealth_above {
        out.burden = true;
        out.deltas.wealth -= rc.burden_penalty;
    }

    // (d)
    if rel.same > rc.robbery_self_above && rel.wealth > rc.robbery_wealth_above {
        let mut r = Robbery { factor: 1.0, ..Default::default() };
        if rel.output > rc.mediation_full {
            r.factor = 0.0;
            r.exemptions.push(Exemption::Mediation);
        } else if rel.output > rc.mediation_partial {
            r.factor = 0.5;
            r.exemptions.push(Exemption::PartialMediation);
        }
        if rel.authority >= rc.shield {
            r.factor = 0.0;
            r.exemptions.push(Exemption::Shield);
        }
        if dm_element == Some(Element::Earth) && r.factor > 0.0 {
            r.factor *= rc.alliance_factor.clamp(0.0, 1.0);
            r.exemptions.push(Exemption::Alliance);
        }
        r.wealth_penalty = rc.robbery_wealth_penalty * r.factor;
        r.relationship_penalty = rc.robbery_relationship_penalty * r.factor;
        out.deltas.wealth -= r.wealth_penalty;
        out.deltas.relationship -= r.relationship_penalty;
        out.robbery = Some(r);
    }

    out
}

/* ──────────────────────────────────────────────────────────────────────────
Aggregate
────────────────────────────────────────────────────────────────────────── */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outlook {
    Collapse,
    Risk,
    Neutral,
    Opportunity,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scorecard {
    pub scores: ScoreBundle,
    pub base: ScoreBundle,
    pub engine_deltas: ScoreBundle,
    pub rules: RuleOutcome,
    pub icon: Option<Icon>,
    pub outlook: Outlook,
}

/// Combine base physics, engine deltas and the ordered rules.
pub fn aggregate(
    rel: &RelationEnergies,
    dm_element: Option<Element>,
    reports: &[EngineReport],
    cfg: &Config,
) -> Scorecard {
    let base = base_scores(rel, cfg);
    let engine_deltas = reports
        .iter()
        .fold(ScoreBundle::ZERO, |acc, r| acc + r.deltas);
    let rules = apply_rules(rel, dm_element, &cfg.score.rules);
    let scores = (base + engine_deltas + rules.deltas).map(|v| v.clamp(0.0, 100.0));

    let icon = reports
        .iter()
        .fold(None, |acc, r| Icon::most_urgent(acc, r.icon));
    let net = engine_deltas.sum() + rules.deltas.sum();
    let margin = cfg.score.outlook_margin;
    let outlook = if icon == Some(Icon::Skull) {
        Outlook::Collapse
    } else if net <= -margin {
        Outlook::Risk
    } else if net >= margin {
        Outlook::Opportunity
    } else {
        Outlook::Neutral
    };
    debug!(?scores, ?icon, ?outlook, "aggregate");

    Scorecard { scores, base, engine_deltas, rules, icon, outlook }
}

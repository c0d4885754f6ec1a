//! Particle model: one stateful unit per chart token.
//!
//! Particles are rebuilt from the chart on every pass. Health is the only
//! value carried between passes, through an explicit [`HealthMap`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::chart::{Chart, DynamicContext, Pillar, PillarPair};
use crate::config::Config;
use crate::mechanics::energy::clamp_health;
use crate::physics::wave::Wave;
use crate::symbols::{Branch, Element, Polarity, Stem};

/// Particle id → health in [0, 100].
pub type HealthMap = BTreeMap<String, f64>;

pub const FULL_HEALTH: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Stem(Stem),
    Branch(Branch),
}

impl Token {
    pub fn element(self) -> Element {
        match self {
            Token::Stem(s) => s.element(),
            Token::Branch(b) => b.element(),
        }
    }

    pub fn polarity(self) -> Polarity {
        match self {
            Token::Stem(s) => s.polarity(),
            Token::Branch(b) => b.polarity(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Token::Stem(s) => s.name(),
            Token::Branch(b) => b.name(),
        }
    }
}

/// Where a particle came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    Natal(Pillar),
    Luck,
    Annual,
}

impl Origin {
    fn prefix(self) -> &'static str {
        match self {
            Origin::Natal(p) => p.name(),
            Origin::Luck => "dy",
            Origin::Annual => "ln",
        }
    }
}

/// Status tags describing which rules fired on a particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Rooted,
    VirtualImage,
    HighIntensity,
    Trine(Element),
    HalfTrine,
    Combined,
    Ruptured,
    ShearStress,
    Harmed,
    ChainTerminal,
    SystemFocus,
    Repaired,
    Activated,
    StructureBroken,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Rooted => f.write_str("rooted"),
            Status::VirtualImage => f.write_str("virtual_image"),
            Status::HighIntensity => f.write_str("high_intensity"),
            Status::Trine(e) => write!(f, "trine:{e}"),
            Status::HalfTrine => f.write_str("half_trine"),
            Status::Combined => f.write_str("six_combined"),
            Status::Ruptured => f.write_str("ruptured"),
            Status::ShearStress => f.write_str("shear_stress"),
            Status::Harmed => f.write_str("harmed"),
            Status::ChainTerminal => f.write_str("chain_terminal"),
            Status::SystemFocus => f.write_str("system_focus"),
            Status::Repaired => f.write_str("repaired"),
            Status::Activated => f.write_str("activated"),
            Status::StructureBroken => f.write_str("structure_broken"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// `year_stem`, `month_branch`, `dy_branch`, `ln_stem`, ...
pub fn particle_id(token: Token, origin: Origin) -> String {
    let kind = match token {
        Token::Stem(_) => "stem",
        Token::Branch(_) => "branch",
    };
    format!("{}_{kind}", origin.prefix())
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub id: String,
    pub token: Token,
    pub origin: Origin,
    pub wave: Wave,
    pub status: Vec<Status>,
    pub health: f64,
}

impl Particle {
    pub fn new(token: Token, origin: Origin, wave: Wave, health: f64) -> Self {
        Self {
            id: particle_id(token, origin),
            token,
            origin,
            wave,
            status: Vec::new(),
            health: clamp_health(health),
        }
    }

    /// health / 100, the factor applied to every amplitude this particle is
    /// assigned during a pass.
    #[inline]
    pub fn vitality(&self) -> f64 {
        self.health / FULL_HEALTH
    }

    #[inline]
    pub fn element(&self) -> Element {
        self.token.element()
    }

    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.wave.amplitude()
    }

    pub fn stem(&self) -> Option<Stem> {
        match self.token {
            Token::Stem(s) => Some(s),
            Token::Branch(_) => None,
        }
    }

    pub fn branch(&self) -> Option<Branch> {
        match self.token {
            Token::Branch(b) => Some(b),
            Token::Stem(_) => None,
        }
    }

    #[inline]
    pub fn is_natal(&self) -> bool {
        matches!(self.origin, Origin::Natal(_))
    }

    pub fn pillar(&self) -> Option<Pillar> {
        match self.origin {
            Origin::Natal(p) => Some(p),
            _ => None,
        }
    }

    /// Same or neighbouring natal pillar. Injected particles are never adjacent.
    pub fn adjacent(&self, other: &Particle) -> bool {
        match (self.pillar(), other.pillar()) {
            (Some(a), Some(b)) => a.index().abs_diff(b.index()) <= 1,
            _ => false,
        }
    }

    pub fn tag(&mut self, s: Status) {
        if !self.status.contains(&s) {
            self.status.push(s);
        }
    }

    pub fn has(&self, s: Status) -> bool {
        self.status.contains(&s)
    }

    /// Carrying a status that makes low amplitude cost health.
    pub fn is_broken(&self) -> bool {
        self.has(Status::StructureBroken) || self.has(Status::Ruptured)
    }
}

/// Final per-particle state for the output bundle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParticleState {
    pub id: String,
    pub symbol: &'static str,
    pub element: Element,
    pub amplitude: f64,
    pub entropy: f64,
    pub shares: [f64; 5],
    pub health: f64,
    pub tags: Vec<Status>,
}

impl From<&Particle> for ParticleState {
    fn from(p: &Particle) -> Self {
        Self {
            id: p.id.clone(),
            symbol: p.token.name(),
            element: p.element(),
            amplitude: p.amplitude(),
            entropy: p.wave.entropy(),
            shares: *p.wave.shares(),
            health: p.health,
            tags: p.status.clone(),
        }
    }
}

/// Build the particle set for one pass.
///
/// Four natal pillars contribute a stem and a branch each; the dynamic
/// context appends up to four injected particles. Missing symbols are
/// skipped. A carried health below 100 scales the initial amplitude.
pub fn build(
    chart: &Chart,
    ctx: Option<&DynamicContext>,
    carried: Option<&HealthMap>,
    cfg: &Config,
) -> Vec<Particle> {
    let phys = &cfg.physics;
    let mut out = Vec::with_capacity(12);

    let health_of = |id: &str| -> f64 {
        carried
            .and_then(|m| m.get(id).copied())
            .map(clamp_health)
            .unwrap_or(FULL_HEALTH)
    };

    let mut push = |token: Token, origin: Origin, amplitude: f64| {
        let wave = match token {
            Token::Stem(s) => Wave::one_hot(s.element(), amplitude),
            Token::Branch(b) => Wave::from_branch(b, amplitude),
        };
        let mut p = Particle::new(token, origin, wave, health_of(&particle_id(token, origin)));
        let v = p.vitality();
        if v < 1.0 {
            p.wave.scale(v);
        }
        out.push(p);
    };

    for pillar in Pillar::ALL {
        let pair = chart.pillar(pillar);
        if let Some(s) = pair.stem {
            push(Token::Stem(s), Origin::Natal(pillar), phys.stem_virtual);
        }
        if let Some(b) = pair.branch {
            let a = phys.branch_base * phys.position_weights.for_pillar(pillar);
            push(Token::Branch(b), Origin::Natal(pillar), a);
        }
    }

    if let Some(ctx) = ctx {
        let injected = [
            (ctx.luck, Origin::Luck, phys.luck_amplitude),
            (ctx.annual, Origin::Annual, phys.annual_amplitude),
        ];
        for (pair, origin, amplitude) in injected {
            let Some(PillarPair { stem, branch }) = pair else { continue };
            if let Some(s) = stem {
                push(Token::Stem(s), origin, amplitude);
            }
            if let Some(b) = branch {
                push(Token::Branch(b), origin, amplitude);
            }
        }
    }

    out
}

/// Health after a pass: broken particles below the survival floor lose
/// `health_damage`; everything else keeps its health.
pub fn settle_health(particles: &mut [Particle], cfg: &Config) -> HealthMap {
    let phys = &cfg.physics;
    let mut map = HealthMap::new();
    for p in particles.iter_mut() {
        if p.is_broken() && p.amplitude() < phys.survival_floor {
            p.health = clamp_health(p.health - phys.health_damage);
        }
        map.insert(p.id.clone(), p.health);
    }
    map
}

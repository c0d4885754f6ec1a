//! Chart input: four named pillars, each a (stem, branch) pair, plus the
//! optional dynamic context (luck cycle and annual pillar).
//!
//! Parsing is tolerant. An unrecognized symbol or a missing pillar becomes
//! an absent slot and is logged; downstream code simply skips it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::symbols::{Branch, Stem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    Year = 0,
    Month = 1,
    Day = 2,
    Hour = 3,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [Pillar::Year, Pillar::Month, Pillar::Day, Pillar::Hour];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Pillar::Year => "year",
            Pillar::Month => "month",
            Pillar::Day => "day",
            Pillar::Hour => "hour",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One stem/branch pair; either half may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPair", into = "RawPair")]
pub struct PillarPair {
    pub stem: Option<Stem>,
    pub branch: Option<Branch>,
}

impl PillarPair {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        Self { stem: Some(stem), branch: Some(branch) }
    }

    /// Tolerant parse; unknown tokens become `None`.
    pub fn parse(stem: &str, branch: &str) -> Self {
        Self { stem: parse_symbol(stem), branch: parse_symbol(branch) }
    }

    pub fn is_empty(&self) -> bool {
        self.stem.is_none() && self.branch.is_none()
    }
}

impl fmt::Display for PillarPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stem.map(|s| s.name()).unwrap_or("?");
        let b = self.branch.map(|b| b.name()).unwrap_or("?");
        write!(f, "{s}-{b}")
    }
}

fn parse_symbol<T: std::str::FromStr<Err = crate::Error>>(token: &str) -> Option<T> {
    if token.trim().is_empty() {
        return None;
    }
    match token.parse() {
        Ok(s) => Some(s),
        Err(err) => {
            warn!(%err, "dropping unrecognized chart symbol");
            None
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawPair {
    #[serde(default)]
    stem: String,
    #[serde(default)]
    branch: String,
}

impl From<RawPair> for PillarPair {
    fn from(r: RawPair) -> Self {
        PillarPair::parse(&r.stem, &r.branch)
    }
}

impl From<PillarPair> for RawPair {
    fn from(p: PillarPair) -> Self {
        RawPair {
            stem: p.stem.map(|s| s.name().to_string()).unwrap_or_default(),
            branch: p.branch.map(|b| b.name().to_string()).unwrap_or_default(),
        }
    }
}

/// The natal chart. Pillar names are fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub year: PillarPair,
    #[serde(default)]
    pub month: PillarPair,
    #[serde(default)]
    pub day: PillarPair,
    #[serde(default)]
    pub hour: PillarPair,
}

impl Chart {
    pub fn new(pairs: [(Stem, Branch); 4]) -> Self {
        let [y, m, d, h] = pairs.map(|(s, b)| PillarPair::new(s, b));
        Self { year: y, month: m, day: d, hour: h }
    }

    /// Tolerant parse of four `(stem, branch)` token pairs in
    /// year, month, day, hour order.
    pub fn parse(pairs: [(&str, &str); 4]) -> Self {
        let [y, m, d, h] = pairs.map(|(s, b)| PillarPair::parse(s, b));
        Self { year: y, month: m, day: d, hour: h }
    }

    pub fn pillar(&self, p: Pillar) -> &PillarPair {
        match p {
            Pillar::Year => &self.year,
            Pillar::Month => &self.month,
            Pillar::Day => &self.day,
            Pillar::Hour => &self.hour,
        }
    }

    /// The day stem, reference point for all role classification.
    pub fn day_master(&self) -> Option<Stem> {
        self.day.stem
    }

    pub fn stems(&self) -> impl Iterator<Item = (Pillar, Stem)> + '_ {
        Pillar::ALL
            .into_iter()
            .filter_map(|p| self.pillar(p).stem.map(|s| (p, s)))
    }

    pub fn branches(&self) -> impl Iterator<Item = (Pillar, Branch)> + '_ {
        Pillar::ALL
            .into_iter()
            .filter_map(|p| self.pillar(p).branch.map(|b| (p, b)))
    }
}

/// Externally injected time layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicContext {
    #[serde(default)]
    pub luck: Option<PillarPair>,
    #[serde(default)]
    pub annual: Option<PillarPair>,
}

impl DynamicContext {
    pub fn annual(annual: PillarPair) -> Self {
        Self { luck: None, annual: Some(annual) }
    }

    pub fn with_luck(mut self, luck: PillarPair) -> Self {
        self.luck = Some(luck);
        self
    }

    pub fn annual_branch(&self) -> Option<Branch> {
        self.annual.and_then(|p| p.branch)
    }

    pub fn annual_stem(&self) -> Option<Stem> {
        self.annual.and_then(|p| p.stem)
    }

    pub fn luck_branch(&self) -> Option<Branch> {
        self.luck.and_then(|p| p.branch)
    }
}

//! Skull engine: punishment groups, self-punishment, clash and harm density.
//!
//! Reads the four pillar branches plus the annual branch. The chou-xu-wei
//! group is terminal: when complete it raises the skull icon, which the
//! aggregator lets override everything else.

use serde::Serialize;
use tracing::debug;

use crate::config::{Config, SkullConfig};
use crate::symbols::{Branch, PUNISHMENTS, SELF_PUNISHMENT};
use crate::systems::sdk::{Engine, EngineInput, EngineReport, Icon, ScoreBundle};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SkullFindings {
    pub groups: Vec<&'static str>,
    pub terminal: bool,
    pub self_punishing: Vec<Branch>,
    pub clashes: usize,
    pub harms: usize,
    pub penalty: f64,
}

#[derive(Clone, Debug)]
pub struct SkullEngine {
    cfg: SkullConfig,
}

impl SkullEngine {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.skull.clone() }
    }

    pub fn inspect(&self, input: &EngineInput<'_>) -> SkullFindings {
        let c = &self.cfg;
        let mut branches: Vec<Branch> = input.chart.branches().map(|(_, b)| b).collect();
        if let Some(b) = input.annual_branch() {
            branches.push(b);
        }
        let mut counts = [0usize; 12];
        for b in &branches {
            counts[b.index()] += 1;
        }

        let mut f = SkullFindings::default();
        for g in PUNISHMENTS.iter() {
            if !g.members.iter().all(|m| counts[m.index()] > 0) {
                continue;
            }
            f.penalty += if g.terminal {
                c.terminal_penalty
            } else if g.members.len() >= 3 {
                c.three_penalty
            } else {
                c.pair_penalty
            };
            f.terminal |= g.terminal;
            f.groups.push(g.key);
        }

        for s in SELF_PUNISHMENT {
            if counts[s.index()] >= 2 {
                f.self_punishing.push(s);
                f.penalty += c.self_penalty;
            }
        }

        for (i, a) in branches.iter().enumerate() {
            for b in &branches[i + 1..] {
                if a.clashes(*b) {
                    f.clashes += 1;
                }
                if a.harms(*b) {
                    f.harms += 1;
                }
            }
        }
        f.penalty += f.clashes as f64 * c.clash_each + f.harms as f64 * c.harm_each;
        f
    }
}

impl Engine for SkullEngine {
    fn name(&self) -> &'static str {
        "skull"
    }

    fn evaluate(&self, input: &EngineInput<'_>) -> EngineReport {
        let f = self.inspect(input);
        let mut rep = EngineReport::empty(self.name());
        let split = self.cfg.domain_split;
        rep.deltas = ScoreBundle::new(split.career, split.wealth, split.relationship) * -f.penalty;

        rep.icon = if f.terminal {
            Some(Icon::Skull)
        } else if !f.groups.is_empty() || !f.self_punishing.is_empty() {
            Some(Icon::Warning)
        } else {
            None
        };
        rep.tags.extend(f.groups.iter().map(|k| format!("punishment:{k}")));
        rep.tags.extend(f.self_punishing.iter().map(|b| format!("self_punishment:{b}")));
        if f.clashes > 0 {
            rep.tags.push(format!("clashes:{}", f.clashes));
        }
        if f.harms > 0 {
            rep.tags.push(format!("harms:{}", f.harms));
        }
        debug!(penalty = f.penalty, terminal = f.terminal, "skull");
        rep
    }
}

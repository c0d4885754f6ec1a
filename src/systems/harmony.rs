//! Harmony engine: fusion vs fission of the annual branch against the chart,
//! plus stem five-combinations between adjacent pillars.
//!
//! Fusion takes precedence: when the annual branch forms any trine,
//! half-trine or six-combination with the chart, each clash it also makes
//! costs only the resolution cost ("greedy for combination").

use serde::Serialize;
use tracing::debug;

use crate::chart::{Chart, Pillar};
use crate::config::{Config, HarmonyConfig};
use crate::symbols::{Branch, Element, Stem};
use crate::systems::sdk::{Engine, EngineInput, EngineReport, Icon, ScoreBundle};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FiveCombo {
    pub pillars: (Pillar, Pillar),
    pub stems: (Stem, Stem),
    pub target: Element,
    pub transformed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HarmonyBreakdown {
    pub fusion: Vec<String>,
    pub fusion_score: f64,
    /// One entry per clash, after the greedy-for-combination rule.
    pub clash_costs: Vec<f64>,
    pub day_clash: bool,
    pub five_combos: Vec<FiveCombo>,
}

impl HarmonyBreakdown {
    pub fn fission_penalty(&self) -> f64 {
        self.clash_costs.iter().sum()
    }
}

#[derive(Clone, Debug)]
pub struct HarmonyEngine {
    cfg: HarmonyConfig,
}

impl HarmonyEngine {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.harmony.clone() }
    }

    pub fn analyze(&self, input: &EngineInput<'_>) -> HarmonyBreakdown {
        let mut out = HarmonyBreakdown::default();
        if let Some(ab) = input.annual_branch() {
            self.fusion(input.chart, ab, &mut out);
            self.fission(input.chart, ab, &mut out);
        }
        self.five_combinations(input.chart, &mut out);
        out
    }

    fn fusion(&self, chart: &Chart, ab: Branch, out: &mut HarmonyBreakdown) {
        let c = &self.cfg;
        let present: Vec<Branch> = chart.branches().map(|(_, b)| b).collect();

        let group = ab.trine();
        let others: Vec<Branch> = group.members.iter().copied().filter(|m| *m != ab).collect();
        if others.iter().all(|m| present.contains(m)) {
            out.fusion.push(format!("trine:{}", group.element));
            out.fusion_score += c.trine_bonus;
        } else {
            for m in others.iter().filter(|m| present.contains(m)) {
                if ab.half_trine(*m).is_some() {
                    out.fusion.push(format!("half_trine:{ab}-{m}"));
                    out.fusion_score += c.half_trine_bonus;
                }
            }
        }

        for b in &present {
            if let Some(e) = ab.six_combination(*b) {
                out.fusion.push(format!("combination:{ab}-{b}:{e}"));
                out.fusion_score += c.combo_bonus;
            }
        }
    }

    fn fission(&self, chart: &Chart, ab: Branch, out: &mut HarmonyBreakdown) {
        let c = &self.cfg;
        let greedy = !out.fusion.is_empty();
        for (pillar, b) in chart.branches() {
            if !ab.clashes(b) {
                continue;
            }
            out.clash_costs.push(if greedy { c.resolution_cost } else { c.clash_penalty });
            if pillar == Pillar::Day && !greedy {
                out.day_clash = true;
            }
        }
    }

    fn five_combinations(&self, chart: &Chart, out: &mut HarmonyBreakdown) {
        let season = chart.month.branch.map(|b| b.element());
        for (pa, pb) in [
            (Pillar::Year, Pillar::Month),
            (Pillar::Month, Pillar::Day),
            (Pillar::Day, Pillar::Hour),
        ] {
            let (Some(a), Some(b)) = (chart.pillar(pa).stem, chart.pillar(pb).stem) else {
                continue;
            };
            if let Some(target) = a.five_combination(b) {
                out.five_combos.push(FiveCombo {
                    pillars: (pa, pb),
                    stems: (a, b),
                    target,
                    transformed: season == Some(target),
                });
            }
        }
    }
}

impl Engine for HarmonyEngine {
    fn name(&self) -> &'static str {
        "harmony"
    }

    fn evaluate(&self, input: &EngineInput<'_>) -> EngineReport {
        let c = &self.cfg;
        let h = self.analyze(input);
        let mut rep = EngineReport::empty(self.name());

        let f = h.fusion_score;
        let x = h.fission_penalty();
        rep.deltas = ScoreBundle::new(f - x, 0.5 * (f - x), 0.5 * (f - x));
        if h.day_clash {
            rep.deltas.relationship -= c.day_clash_relationship;
        }

        for fc in &h.five_combos {
            let tag = if fc.transformed { "transformed" } else { "bound" };
            rep.tags.push(format!("five_combo:{}-{}:{}:{tag}", fc.stems.0, fc.stems.1, fc.target));
            if fc.transformed {
                // a combination touching the day stem binds the self to a partner
                if fc.pillars.0 == Pillar::Day || fc.pillars.1 == Pillar::Day {
                    rep.deltas.relationship += c.five_combo_bonus;
                } else {
                    rep.deltas.career += c.five_combo_bonus;
                }
            }
        }

        rep.tags.extend(h.fusion.iter().cloned());
        if !h.clash_costs.is_empty() {
            rep.tags.push(format!("clashes:{}", h.clash_costs.len()));
        }
        rep.icon = if !h.fusion.is_empty() {
            Some(Icon::Handshake)
        } else if !h.clash_costs.is_empty() {
            Some(Icon::Lightning)
        } else {
            None
        };
        debug!(fusion = f, fission = x, "harmony");
        rep
    }
}

//! Luck engine: calendrical bookkeeping only.
//!
//! Maps civil years onto the sexagenary cycle, finds the active ten-year
//! luck cycle for an age or year, flags handovers and lays out timelines.
//! No scoring happens here; the analyzer turns timeline entries into
//! dynamic contexts.

use serde::{Deserialize, Serialize};

use crate::chart::PillarPair;
use crate::symbols::{Branch, Stem};

/// 1984 is jia-zi, the first pair of the cycle.
pub const BASE_YEAR: i32 = 1984;

/// Position 0..60 in the sexagenary cycle.
pub fn cycle_index(stem: Stem, branch: Branch) -> Option<usize> {
    (0..60).find(|k| k % 10 == stem.index() && k % 12 == branch.index())
}

pub fn pillar_at(index: i64) -> PillarPair {
    let k = index.rem_euclid(60) as usize;
    PillarPair::new(Stem::from_index(k % 10), Branch::from_index(k % 12))
}

/// Annual pillar of a civil year.
pub fn year_pillar(year: i32) -> PillarPair {
    pillar_at(i64::from(year) - i64::from(BASE_YEAR))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LuckCycle {
    pub pillar: PillarPair,
    pub start_age: u32,
    pub end_age: u32,
    pub start_year: i32,
    pub end_year: i32,
}

impl LuckCycle {
    /// Conventional ladder: step the month pillar forward (or backward)
    /// through the cycle, ten years per step.
    pub fn build_sequence(
        month: PillarPair,
        forward: bool,
        start_age: u32,
        birth_year: i32,
        count: usize,
    ) -> Vec<LuckCycle> {
        let (Some(s), Some(b)) = (month.stem, month.branch) else {
            return Vec::new();
        };
        let Some(base) = cycle_index(s, b) else {
            return Vec::new();
        };
        let dir: i64 = if forward { 1 } else { -1 };
        (0..count)
            .map(|k| {
                let start = start_age + 10 * k as u32;
                let end = start + 9;
                LuckCycle {
                    pillar: pillar_at(base as i64 + dir * (k as i64 + 1)),
                    start_age: start,
                    end_age: end,
                    start_year: birth_year + start as i32,
                    end_year: birth_year + end as i32,
                }
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub year: i32,
    pub age: i32,
    pub annual: PillarPair,
    pub cycle: Option<LuckCycle>,
    pub handover: bool,
}

#[derive(Clone, Debug, Default)]
pub struct LuckEngine {
    cycles: Vec<LuckCycle>,
}

impl LuckEngine {
    pub fn new(mut cycles: Vec<LuckCycle>) -> Self {
        cycles.sort_by_key(|c| c.start_year);
        Self { cycles }
    }

    pub fn cycles(&self) -> &[LuckCycle] {
        &self.cycles
    }

    pub fn active_by_age(&self, age: u32) -> Option<&LuckCycle> {
        self.cycles.iter().find(|c| c.start_age <= age && age <= c.end_age)
    }

    pub fn active_by_year(&self, year: i32) -> Option<&LuckCycle> {
        self.cycles.iter().find(|c| c.start_year <= year && year <= c.end_year)
    }

    /// A new cycle is active in `year` that was not active the year before.
    pub fn is_handover(&self, year: i32) -> bool {
        match (self.active_by_year(year), self.active_by_year(year - 1)) {
            (Some(now), prev) => prev != Some(now),
            (None, _) => false,
        }
    }

    pub fn timeline(&self, start_year: i32, len: usize, birth_year: i32) -> Vec<TimelineEntry> {
        (0..len as i32)
            .map(|k| {
                let year = start_year + k;
                TimelineEntry {
                    year,
                    age: year - birth_year,
                    annual: year_pillar(year),
                    cycle: self.active_by_year(year).copied(),
                    handover: self.is_handover(year),
                }
            })
            .collect()
    }
}

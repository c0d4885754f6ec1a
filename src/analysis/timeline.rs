//! Year-by-year readings driven by the luck engine.

use serde::Serialize;

use crate::analysis::{Analysis, Analyzer};
use crate::chart::{Chart, DynamicContext};
use crate::physics::HealthMap;
use crate::systems::luck::{LuckEngine, TimelineEntry};

#[derive(Clone, Debug, Serialize)]
pub struct YearReading {
    pub entry: TimelineEntry,
    pub analysis: Analysis,
}

impl Analyzer {
    /// One pass per year from `start_year`, with the annual pillar and the
    /// active luck cycle injected, health threaded across years.
    pub fn run_timeline(
        &self,
        chart: &Chart,
        luck: &LuckEngine,
        start_year: i32,
        years: usize,
        birth_year: i32,
        carried: HealthMap,
    ) -> (HealthMap, Vec<YearReading>) {
        let entries = luck.timeline(start_year, years, birth_year);
        let contexts: Vec<DynamicContext> = entries
            .iter()
            .map(|e| DynamicContext { luck: e.cycle.map(|c| c.pillar), annual: Some(e.annual) })
            .collect();
        let (health, analyses) = self.run_passes(chart, &contexts, carried);
        let readings = entries
            .into_iter()
            .zip(analyses)
            .map(|(entry, analysis)| YearReading { entry, analysis })
            .collect();
        (health, readings)
    }
}

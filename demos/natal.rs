// demos/natal.rs
// Run with:
//   cargo run --example natal

use qi_field::physics::HealthMap;
use qi_field::systems::luck::{LuckCycle, LuckEngine};
use qi_field::{Analyzer, Chart, Config, PillarPair};

fn main() -> qi_field::Result<()> {
    // Chart symbols come from a calendar service; any spelling FromStr accepts works.
    let chart = Chart::parse([("geng", "wu"), ("wu", "yin"), ("jia", "zi"), ("bing", "yin")]);

    // Start from defaults and nudge a couple of tunables.
    let cfg = Config::from_json(r#"{ "flow": { "rate": 0.1 }, "treasury": { "punishment_opens": true } }"#)?;
    let analyzer = Analyzer::new(cfg);

    let natal = analyzer.compute(&chart, None, None);
    println!("== Natal ==");
    println!("scores    -> {:?}", natal.scores);
    println!("strength  -> {:?}", natal.strength);
    println!("spectrum  -> {}", serde_json::to_string(&natal.spectrum).unwrap_or_default());
    for e in &natal.events {
        println!("event     -> {} (applied: {})", e.rule_key(), e.applied);
    }

    // Ten-year cycles stepping forward from the month pillar.
    let cycles = LuckCycle::build_sequence(chart.month, true, 4, 1990, 8);
    let luck = LuckEngine::new(cycles);
    let (health, years) = analyzer.run_timeline(&chart, &luck, 2020, 8, 1990, HealthMap::new());

    println!("== Timeline ==");
    for r in &years {
        let cycle = r.entry.cycle.map(|c| c.pillar).unwrap_or_else(PillarPair::default);
        println!(
            "{} age {:>2} {} luck {}{} -> {:?} {:?} {:?}",
            r.entry.year,
            r.entry.age,
            r.entry.annual,
            cycle,
            if r.entry.handover { " (handover)" } else { "" },
            r.analysis.scores,
            r.analysis.icon,
            r.analysis.outlook,
        );
    }
    println!("health    -> {health:?}");
    Ok(())
}

// demos/calibrate.rs
// Run with:
//   cargo run --example calibrate --features calibration

use qi_field::calibration::{ParamSpace, Strategy, Tuner, TunerConfig, load_cases};
use qi_field::Config;

const CASES: &str = r#"[
    {
        "label": "water trine, fire year",
        "chart": {
            "year":  { "stem": "ren", "branch": "shen" },
            "month": { "stem": "gui", "branch": "zi" },
            "day":   { "stem": "wu", "branch": "chen" },
            "hour":  { "stem": "ding", "branch": "si" }
        },
        "context": { "annual": { "stem": "bing", "branch": "wu" } },
        "expected": { "career": 64.0, "wealth": 71.0, "relationship": 58.0 }
    },
    {
        "label": "clash-heavy",
        "chart": {
            "year":  { "stem": "jia", "branch": "zi" },
            "month": { "stem": "geng", "branch": "wu" },
            "day":   { "stem": "yi", "branch": "mao" },
            "hour":  { "stem": "xin", "branch": "you" }
        },
        "expected": { "career": 41.0, "wealth": 38.0, "relationship": 35.0 }
    },
    {
        "label": "earth vault, dragon year",
        "chart": {
            "year":  { "stem": "wu", "branch": "xu" },
            "month": { "stem": "bing", "branch": "chen" },
            "day":   { "stem": "ji", "branch": "chou" },
            "hour":  { "stem": "geng", "branch": "wu" }
        },
        "context": { "annual": { "stem": "jia", "branch": "chen" } },
        "expected": { "career": 55.0, "wealth": 60.0, "relationship": 47.0 }
    }
]"#;

fn main() -> qi_field::Result<()> {
    let cases = load_cases(CASES)?;
    let base = Config::default();

    let space = ParamSpace::new()
        .param("score.baseline")
        .floored("structure.trine_boost", 0.05)
        .floored("structure.clash_loss", 0.05)
        .floored("physics.position_weights.month", 0.1);

    for strategy in [Strategy::FiniteDifference, Strategy::HillClimb { seed: 42, step: 0.15 }] {
        let tuner = Tuner::new(
            space.clone(),
            TunerConfig { learning_rate: 0.5, strategy, ..TunerConfig::default() },
        );
        let report = tuner.fit_from(&cases, &base, 40)?;
        println!("== {strategy:?} ==");
        println!("error     -> {:.3} → {:.3}", report.initial_error, report.best_error);
        println!("iters     -> {} (converged: {})", report.iterations, report.converged);
        for (path, v) in &report.params {
            println!("  {path:<34} {v:.4}");
        }
    }
    Ok(())
}

// tests/analysis.rs
use qi_field::physics::{HealthMap, Status};
use qi_field::{Analyzer, Branch, Chart, Config, DynamicContext, Error, PillarPair, Stem};
use serde_json::json;

fn clash_chart() -> Chart {
    Chart::parse([("jia", "zi"), ("ding", "si"), ("wu", "wu"), ("ji", "si")])
}

fn busy_context() -> DynamicContext {
    DynamicContext::annual(PillarPair::new(Stem::Geng, Branch::Xu))
        .with_luck(PillarPair::new(Stem::Bing, Branch::Yin))
}

#[test]
fn compute_is_deterministic() {
    let an = Analyzer::default();
    let c = Chart::parse([("ren", "shen"), ("gui", "zi"), ("wu", "chen"), ("ding", "wu")]);
    let ctx = busy_context();
    let mut carried = HealthMap::new();
    carried.insert("day_branch".into(), 60.0);

    let a = an.compute(&c, Some(&ctx), Some(&carried));
    let b = an.compute(&c, Some(&ctx), Some(&carried));
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).expect("serialize"),
        serde_json::to_string(&b).expect("serialize")
    );
}

#[test]
fn output_bundle_carries_the_full_contract() {
    let an = Analyzer::default();
    let a = an.compute(&clash_chart(), Some(&busy_context()), None);
    let v = serde_json::to_value(&a).expect("serialize");
    for key in ["scores", "spectrum", "events", "particles", "health", "roles", "icon", "outlook", "reports", "trace"] {
        assert!(v.get(key).is_some(), "missing `{key}`");
    }
    assert!(v["spectrum"].get("wood").is_some());
    assert!(v["roles"].get("direct_wealth").is_some());
    for s in a.scores.as_array() {
        assert!((0.0..=100.0).contains(&s), "score {s} out of range");
    }
    assert_eq!(a.particles.len(), 12);
    assert_eq!(a.health.len(), 12);
}

#[test]
fn chart_without_day_master_still_scores() {
    let an = Analyzer::default();
    let c = Chart::parse([("jia", "zi"), ("", "si"), ("", "wu"), ("", "")]);
    let a = an.compute(&c, None, None);
    assert_eq!(a.roles.total(), 0.0);
    assert_eq!(a.strength.ratio, 0.0);
    assert!(a.scores.as_array().iter().all(|s| s.is_finite()));
}

#[test]
fn health_decay_threads_across_passes() {
    let cfg = Config::default().set("physics.survival_floor", 50.0).expect("set");
    let an = Analyzer::new(cfg.clone());
    let c = clash_chart();

    let first = an.compute(&c, None, None);
    let ruptured = first.particle("year_branch").expect("year branch");
    assert!(ruptured.tags.contains(&Status::Ruptured));
    assert_eq!(first.health["year_branch"], 100.0 - cfg.physics.health_damage);
    assert_eq!(first.health["month_branch"], 100.0);

    let contexts = [DynamicContext::default(), DynamicContext::default()];
    let (health, passes) = an.run_passes(&c, &contexts, HealthMap::new());
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].health, first.health);
    assert_eq!(health["year_branch"], 100.0 - 2.0 * cfg.physics.health_damage);
    assert_eq!(health["day_branch"], 100.0 - 2.0 * cfg.physics.health_damage);
    assert_eq!(health["month_branch"], 100.0);

    // the weakened particle starts the second pass smaller
    let a0 = passes[0].particle("year_branch").expect("p0").amplitude;
    let a1 = passes[1].particle("year_branch").expect("p1").amplitude;
    assert!(a1 < a0, "carried damage must shrink amplitude: {a1} vs {a0}");
}

#[test]
fn disabled_rules_flow_through_the_analyzer() {
    let an = Analyzer::default().with_disabled_rules(["clash:zi-wu"]);
    let a = an.compute(&clash_chart(), None, None);
    let ev = a
        .events
        .iter()
        .find(|e| e.rule_key() == "clash:zi-wu")
        .expect("still reported");
    assert!(!ev.applied);
    let p = a.particle("year_branch").expect("year branch");
    assert!(!p.tags.contains(&Status::Ruptured));
}

#[cfg(feature = "engine-skull")]
#[test]
fn terminal_punishment_collapses_the_outlook() {
    use qi_field::score::Outlook;
    use qi_field::Icon;

    let an = Analyzer::default();
    // chou and xu in the chart, wei arrives with the year
    let c = Chart::parse([("ji", "chou"), ("jia", "xu"), ("wu", "yin"), ("gui", "hai")]);
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Yi, Branch::Wei));
    let a = an.compute(&c, Some(&ctx), None);
    assert_eq!(a.icon, Some(Icon::Skull));
    assert_eq!(a.outlook, Outlook::Collapse);
}

#[cfg(feature = "engine-treasury")]
#[test]
fn reconfigure_rebuilds_engines_from_the_new_tree() {
    let mut an = Analyzer::default();
    let c = Chart::parse([("jia", "chen"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]);
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Geng, Branch::Xu));
    let before = an.compute(&c, Some(&ctx), None);
    let t0 = before.report("treasury").expect("treasury report").deltas;

    an.reconfigure(&json!({ "treasury": { "vault_energy": 20.0 } }))
        .expect("reconfigure");
    assert_eq!(an.config().treasury.vault_energy, 20.0);
    let after = an.compute(&c, Some(&ctx), None);
    let t1 = after.report("treasury").expect("treasury report").deltas;
    assert!((t1.wealth - 2.0 * t0.wealth).abs() < 1e-9, "{t0:?} → {t1:?}");

    // a rejected override leaves the analyzer as it was
    let err = an.reconfigure(&json!({ "treasury": { "vault_energyy": 1.0 } }));
    assert!(matches!(err, Err(Error::Config(_))));
    assert_eq!(an.config().treasury.vault_energy, 20.0);

    an.replace_section("treasury", json!({})).expect("section");
    assert_eq!(an.config().treasury, Config::default().treasury);
}

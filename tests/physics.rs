// tests/physics.rs
use qi_field::physics::particle::Origin;
use qi_field::physics::{
    self, DisabledRules, HealthMap, InteractionKind, Particle, ParticleState, PropagationTrace,
    Status, Token, Wave,
};
use qi_field::{Branch, Chart, Config, DynamicContext, Element, Pillar, PillarPair, Stem};

const EPS: f64 = 1e-9;

fn chart(p: [(&str, &str); 4]) -> Chart {
    Chart::parse(p)
}

fn run(c: &Chart, ctx: Option<&DynamicContext>, disabled: &DisabledRules) -> Vec<Particle> {
    let cfg = Config::default();
    let mut ps = physics::build(c, ctx, None, &cfg);
    physics::detect(&mut ps, &cfg, disabled);
    physics::propagate(&mut ps, &cfg);
    ps
}

fn find<'a>(ps: &'a [Particle], id: &str) -> &'a Particle {
    ps.iter().find(|p| p.id == id).unwrap_or_else(|| panic!("no particle {id}"))
}

fn natal_stem(s: Stem, pillar: Pillar, amplitude: f64) -> Particle {
    Particle::new(Token::Stem(s), Origin::Natal(pillar), Wave::one_hot(s.element(), amplitude), 100.0)
}

fn settle(c: &Chart, ctx: Option<&DynamicContext>, cfg: &Config) -> (Vec<Particle>, PropagationTrace) {
    let mut ps = physics::build(c, ctx, None, cfg);
    let tr = physics::propagate(&mut ps, cfg);
    (ps, tr)
}

fn sample_charts() -> Vec<Chart> {
    vec![
        chart([("jia", "zi"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]),
        chart([("ren", "shen"), ("gui", "zi"), ("wu", "chen"), ("ding", "wu")]),
        chart([("ji", "chou"), ("xin", "xu"), ("yi", "wei"), ("gui", "hai")]),
        chart([("bing", "si"), ("ding", "si"), ("bing", "wu"), ("ding", "wu")]),
        chart([("", "zi"), ("bogus", "mao"), ("jia", ""), ("gui", "you")]),
    ]
}

/* ──────────────────────────────────────────────────────────────────────────
1) Construction
────────────────────────────────────────────────────────────────────────── */

#[test]
fn build_emits_natal_and_injected_particles() {
    let c = chart([("jia", "zi"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]);
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Jia, Branch::Chen))
        .with_luck(PillarPair::new(Stem::Ding, Branch::Mao));
    let ps = physics::build(&c, Some(&ctx), None, &Config::default());
    assert_eq!(ps.len(), 12);

    let mut ids: Vec<&str> = ps.iter().map(|p| p.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 12, "particle ids must be unique");

    let annual = find(&ps, "ln_branch").amplitude();
    let luck = find(&ps, "dy_branch").amplitude();
    assert!(annual > luck, "annual {annual} must outweigh luck {luck}");
    assert_eq!(find(&ps, "day_stem").amplitude(), Config::default().physics.stem_virtual);
    // month carries the largest position weight
    assert!(find(&ps, "month_branch").amplitude() > find(&ps, "hour_branch").amplitude());
}

#[test]
fn missing_and_unknown_symbols_are_skipped() {
    let c = chart([("", "zi"), ("bogus", "mao"), ("jia", ""), ("gui", "you")]);
    let ps = physics::build(&c, None, None, &Config::default());
    assert_eq!(ps.len(), 5);
    assert!(ps.iter().all(|p| p.id != "year_stem" && p.id != "day_branch"));
}

#[test]
fn rebuild_is_idempotent() {
    let cfg = Config::default();
    for c in sample_charts() {
        let a: Vec<ParticleState> =
            physics::build(&c, None, None, &cfg).iter().map(ParticleState::from).collect();
        let b: Vec<ParticleState> =
            physics::build(&c, None, None, &cfg).iter().map(ParticleState::from).collect();
        assert_eq!(a, b);
    }
}

#[test]
fn carried_health_scales_initial_amplitude() {
    let c = chart([("jia", "zi"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]);
    let cfg = Config::default();
    let mut carried = HealthMap::new();
    carried.insert("year_branch".into(), 50.0);

    let fresh = physics::build(&c, None, None, &cfg);
    let hurt = physics::build(&c, None, Some(&carried), &cfg);
    let a = find(&fresh, "year_branch").amplitude();
    let b = find(&hurt, "year_branch").amplitude();
    assert!((b - 0.5 * a).abs() < EPS, "expected half of {a}, got {b}");
    assert_eq!(find(&hurt, "year_branch").health, 50.0);
    assert_eq!(find(&hurt, "month_branch").amplitude(), find(&fresh, "month_branch").amplitude());
}

/* ──────────────────────────────────────────────────────────────────────────
2) Invariants over whole passes
────────────────────────────────────────────────────────────────────────── */

#[test]
fn waves_stay_normalized_and_amplitudes_non_negative() {
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Geng, Branch::Wu))
        .with_luck(PillarPair::new(Stem::Ren, Branch::Zi));
    for c in sample_charts() {
        for ctx in [None, Some(&ctx)] {
            for p in run(&c, ctx, &DisabledRules::new()) {
                assert!(
                    (p.wave.share_sum() - 1.0).abs() < 1e-9,
                    "{}: shares sum to {}",
                    p.id,
                    p.wave.share_sum()
                );
                assert!(p.amplitude() >= 0.0, "{}: negative amplitude", p.id);
                assert!((0.0..=100.0).contains(&p.health));
            }
        }
    }
}

#[test]
fn spectrum_is_the_sum_of_particle_energy() {
    let cfg = Config::default();
    let c = chart([("ren", "shen"), ("gui", "zi"), ("wu", "chen"), ("ding", "wu")]);
    let mut ps = physics::build(&c, None, None, &cfg);
    physics::detect(&mut ps, &cfg, &DisabledRules::new());
    let trace = physics::propagate(&mut ps, &cfg);
    let total: f64 = ps.iter().map(|p| p.amplitude()).sum();
    assert!((trace.spectrum.total() - total).abs() < 1e-9);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Detector
────────────────────────────────────────────────────────────────────────── */

#[test]
fn complete_trine_suppresses_its_pairs() {
    let cfg = Config::default();
    let c = chart([("ren", "shen"), ("gui", "zi"), ("wu", "chen"), ("ding", "wu")]);
    let mut ps = physics::build(&c, None, None, &cfg);
    let events = physics::detect(&mut ps, &cfg, &DisabledRules::new());

    let trines: Vec<_> = events.iter().filter(|e| e.kind == InteractionKind::Trine).collect();
    assert_eq!(trines.len(), 1);
    assert_eq!(trines[0].target, Some(Element::Water));
    assert_eq!(trines[0].rule_key(), "trine:water");

    let members = [Branch::Shen, Branch::Zi, Branch::Chen];
    for e in events.iter().filter(|e| e.kind != InteractionKind::Trine) {
        let inside = e.symbols.iter().filter(|s| members.contains(s)).count();
        assert!(inside < 2, "pair {:?} fired inside a complete trine", e.symbols);
    }
    // zi-wu is outside the trine and still clashes
    assert!(events
        .iter()
        .any(|e| e.kind == InteractionKind::SixClash && e.involves(Branch::Zi, Branch::Wu)));
    assert!(find(&ps, "month_branch").has(Status::Trine(Element::Water)));
}

#[test]
fn clash_ruptures_both_participants() {
    let cfg = Config::default();
    let c = chart([("jia", "zi"), ("ding", "si"), ("wu", "wu"), ("ji", "si")]);
    let before = physics::build(&c, None, None, &cfg);
    let mut ps = before.clone();
    let events = physics::detect(&mut ps, &cfg, &DisabledRules::new());

    let clash = events
        .iter()
        .find(|e| e.kind == InteractionKind::SixClash)
        .expect("zi-wu clash");
    assert!(clash.applied);
    assert_eq!(clash.rule_key(), "clash:zi-wu");
    for id in ["year_branch", "day_branch"] {
        let p = find(&ps, id);
        assert!(p.has(Status::Ruptured));
        assert!(p.amplitude() < find(&before, id).amplitude());
        assert!(p.wave.entropy() > 0.0);
    }
}

#[test]
fn disabled_rules_are_reported_but_inert() {
    let cfg = Config::default();
    let c = chart([("jia", "zi"), ("ding", "si"), ("wu", "wu"), ("ji", "si")]);
    let disabled: DisabledRules = ["clash:zi-wu".to_string()].into_iter().collect();

    let before = physics::build(&c, None, None, &cfg);
    let mut ps = before.clone();
    let events = physics::detect(&mut ps, &cfg, &disabled);

    let clash = events
        .iter()
        .find(|e| e.rule_key() == "clash:zi-wu")
        .expect("disabled clash is still detected");
    assert!(!clash.applied);
    assert!(clash.deltas.is_empty());
    for id in ["year_branch", "day_branch"] {
        assert!(!find(&ps, id).has(Status::Ruptured));
        assert_eq!(find(&ps, id).amplitude(), find(&before, id).amplitude());
    }
}

#[test]
fn self_punishment_and_harm_register_as_pairs() {
    let cfg = Config::default();
    let none = DisabledRules::new();

    let twin = chart([("jia", "wu"), ("bing", "yin"), ("wu", "wu"), ("geng", "hai")]);
    let mut ps = physics::build(&twin, None, None, &cfg);
    let events = physics::detect(&mut ps, &cfg, &none);
    let sp = events
        .iter()
        .find(|e| e.kind == InteractionKind::SelfPunishment)
        .expect("wu-wu self-punishment");
    assert_eq!(sp.rule_key(), "self_punishment:wu");
    assert!(find(&ps, "year_branch").has(Status::ShearStress));
    assert!(find(&ps, "day_branch").has(Status::ShearStress));

    let harm = chart([("jia", "zi"), ("ding", "si"), ("wu", "wei"), ("ji", "si")]);
    let mut ps = physics::build(&harm, None, None, &cfg);
    let events = physics::detect(&mut ps, &cfg, &none);
    let h = events
        .iter()
        .find(|e| e.kind == InteractionKind::SixHarm)
        .expect("zi-wei harm");
    assert_eq!(h.rule_key(), "harm:zi-wei");
    assert!(find(&ps, "year_branch").has(Status::Harmed));
    assert!(!find(&ps, "month_branch").has(Status::Harmed));
}

#[test]
fn annual_particles_do_not_enter_pair_detection() {
    let cfg = Config::default();
    let c = chart([("jia", "yin"), ("bing", "yin"), ("wu", "chen"), ("geng", "shen")]);
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Jia, Branch::Zi));
    let mut ps = physics::build(&c, Some(&ctx), None, &cfg);
    let events = physics::detect(&mut ps, &cfg, &DisabledRules::new());
    assert!(events.iter().all(|e| !e.participants.iter().any(|id| id.starts_with("ln_"))));
}

/* ──────────────────────────────────────────────────────────────────────────
4) Propagator
────────────────────────────────────────────────────────────────────────── */

#[test]
fn rooted_stem_outweighs_unrooted_stem() {
    let none = DisabledRules::new();
    // bing fire among water/metal branches: nothing holds fire
    let isolated = chart([("ren", "zi"), ("geng", "shen"), ("bing", "you"), ("gui", "hai")]);
    // wu hides ding fire at 0.7
    let rooted = chart([("ren", "zi"), ("geng", "shen"), ("bing", "you"), ("gui", "wu")]);

    let a = run(&isolated, None, &none);
    let b = run(&rooted, None, &none);
    let weak = find(&a, "day_stem");
    let strong = find(&b, "day_stem");
    assert!(weak.has(Status::VirtualImage));
    assert!(strong.has(Status::Rooted));
    assert!(
        weak.amplitude() < strong.amplitude(),
        "unrooted {} must be below rooted {}",
        weak.amplitude(),
        strong.amplitude()
    );
}

#[test]
fn annual_clash_breaks_natal_structure() {
    let none = DisabledRules::new();
    let c = chart([("jia", "yin"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]);
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Ren, Branch::Zi));
    let with = run(&c, Some(&ctx), &none);
    let without = run(&c, None, &none);
    let hit = find(&with, "day_branch");
    assert!(hit.has(Status::StructureBroken));
    assert!(hit.amplitude() < find(&without, "day_branch").amplitude());
    assert!(!find(&with, "year_branch").has(Status::StructureBroken));
}

#[test]
fn annual_stem_activates_branches_hiding_its_element() {
    let none = DisabledRules::new();
    let c = chart([("jia", "hai"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]);
    let ctx = DynamicContext::annual(PillarPair::new(Stem::Yi, Branch::Mao));
    let ps = run(&c, Some(&ctx), &none);
    // hai and yin both hide wood
    assert!(find(&ps, "year_branch").has(Status::Activated));
    assert!(find(&ps, "month_branch").has(Status::Activated));
    assert!(!find(&ps, "hour_branch").has(Status::Activated));
}

#[test]
fn heavy_rooting_marks_high_intensity() {
    let cfg = Config::default();
    // four mao branches, all wood: 0.5 × (2.0 + 3.0 + 2.4 + 1.8)
    let dense = chart([("jia", "mao"), ("yi", "mao"), ("jia", "mao"), ("yi", "mao")]);
    let (ps, tr) = settle(&dense, None, &cfg);
    let r = tr.roots.iter().find(|r| r.stem == "year_stem").expect("root record");
    assert!((r.transmitted - 4.6).abs() < EPS, "{}", r.transmitted);
    assert!(r.rooted && r.high_intensity);
    assert!(find(&ps, "year_stem").has(Status::HighIntensity));

    let thin = chart([("jia", "mao"), ("geng", "shen"), ("ren", "zi"), ("geng", "shen")]);
    let (ps, tr) = settle(&thin, None, &cfg);
    let r = tr.roots.iter().find(|r| r.stem == "year_stem").expect("root record");
    assert!((r.transmitted - 1.0).abs() < EPS);
    assert!(r.rooted && !r.high_intensity);
    assert!(find(&ps, "year_stem").has(Status::Rooted));
    assert!(!find(&ps, "year_stem").has(Status::HighIntensity));
}

#[test]
fn generation_flow_moves_energy_along_chains() {
    let mut cfg = Config::default();
    cfg.flow.rate = 0.25;
    // wood → fire → earth across adjacent pillars
    let mut ps = vec![
        natal_stem(Stem::Jia, Pillar::Year, 8.0),
        natal_stem(Stem::Bing, Pillar::Month, 4.0),
        natal_stem(Stem::Wu, Pillar::Day, 1.0),
    ];
    let tr = physics::propagate(&mut ps, &cfg);

    let edges: Vec<(&str, &str, f64, f64)> = tr
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str(), e.sent, e.delivered))
        .collect();
    assert_eq!(edges, [("year_stem", "month_stem", 2.0, 2.0), ("month_stem", "day_stem", 1.0, 1.0)]);
    assert_eq!(tr.chains, [["year_stem".to_string(), "month_stem".to_string(), "day_stem".to_string()]]);

    assert!((find(&ps, "year_stem").amplitude() - 6.0).abs() < EPS);
    assert!((find(&ps, "month_stem").amplitude() - 5.0).abs() < EPS);
    // 1 + 1 received, then the chain bonus
    assert!((find(&ps, "day_stem").amplitude() - 2.0 * cfg.flow.chain_bonus).abs() < EPS);
    assert!(find(&ps, "day_stem").has(Status::ChainTerminal));
    assert!(!find(&ps, "month_stem").has(Status::ChainTerminal));

    // month and day both net +1; the earlier particle takes focus
    assert_eq!(tr.focus.as_deref(), Some("month_stem"));
    assert!(find(&ps, "month_stem").has(Status::SystemFocus));
    assert!(!find(&ps, "day_stem").has(Status::SystemFocus));
}

#[test]
fn outflow_is_capped_at_the_source_amplitude() {
    let mut cfg = Config::default();
    cfg.flow.rate = 0.75;
    let mut ps = vec![
        natal_stem(Stem::Jia, Pillar::Year, 4.0),
        natal_stem(Stem::Bing, Pillar::Month, 1.0),
        natal_stem(Stem::Ding, Pillar::Hour, 1.0),
    ];
    let tr = physics::propagate(&mut ps, &cfg);

    // 2 × 0.75 × 4 would exceed 4, so each edge is cut to 2
    assert_eq!(tr.edges.len(), 2);
    assert!(tr.edges.iter().all(|e| (e.sent - 2.0).abs() < EPS));
    assert!(find(&ps, "year_stem").amplitude().abs() < EPS);
    assert!((find(&ps, "month_stem").amplitude() - 3.0).abs() < EPS);
    // year and hour are not neighbours
    let hour = 1.0 + 2.0 * cfg.flow.remote_efficiency;
    assert!((find(&ps, "hour_stem").amplitude() - hour).abs() < EPS);
    assert!(tr.chains.is_empty());
    assert_eq!(tr.focus.as_deref(), Some("month_stem"));
}

#[test]
fn focus_needs_net_inflow_above_threshold() {
    let mut cfg = Config::default();
    cfg.flow.rate = 0.25;
    cfg.flow.focus_threshold = 5.0;
    let mut ps = vec![
        natal_stem(Stem::Jia, Pillar::Year, 8.0),
        natal_stem(Stem::Bing, Pillar::Month, 4.0),
    ];
    let tr = physics::propagate(&mut ps, &cfg);
    assert_eq!(tr.focus, None);
    assert!(ps.iter().all(|p| !p.has(Status::SystemFocus)));
}

#[test]
fn luck_repairs_only_a_missing_link() {
    let cfg = Config::default();
    let luck = DynamicContext::default().with_luck(PillarPair::new(Stem::Ding, Branch::Si));

    // fire absent, wood and earth present: ding-si closes the gap
    let gap = chart([("jia", "zi"), ("wu", "chen"), ("geng", "shen"), ("ren", "zi")]);
    let (ps, tr) = settle(&gap, Some(&luck), &cfg);
    assert_eq!(tr.spacetime.repaired_by.as_deref(), Some("dy_stem"));
    let tagged: Vec<&str> = ps.iter().filter(|p| p.has(Status::Repaired)).map(|p| p.id.as_str()).collect();
    assert_eq!(tagged, ["dy_stem"]);

    let mut flat = cfg.clone();
    flat.spacetime.repair_multiplier = 1.0;
    let (base, _) = settle(&gap, Some(&luck), &flat);
    for (p, q) in ps.iter().zip(&base) {
        assert!(
            (p.amplitude() - q.amplitude() * cfg.spacetime.repair_multiplier).abs() < EPS,
            "{} scaled more than once",
            p.id
        );
    }

    // fire already in the chart: nothing to repair
    let full = chart([("jia", "zi"), ("bing", "yin"), ("wu", "wu"), ("geng", "shen")]);
    let (ps, tr) = settle(&full, Some(&luck), &cfg);
    assert_eq!(tr.spacetime.repaired_by, None);
    assert!(ps.iter().all(|p| !p.has(Status::Repaired)));
}

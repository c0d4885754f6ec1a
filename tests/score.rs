// tests/score.rs
use qi_field::score::{
    self, Exemption, Outlook, Relation, RelationEnergies, Role, apply_rules,
};
use qi_field::systems::sdk::EngineReport;
use qi_field::{Config, Element, Icon, Polarity, ScoreBundle, Stem};

fn rel(same: f64, output: f64, wealth: f64, authority: f64, resource: f64) -> RelationEnergies {
    RelationEnergies { same, output, wealth, authority, resource }
}

fn report(engine: &'static str, deltas: ScoreBundle, icon: Option<Icon>) -> EngineReport {
    EngineReport { engine, deltas, icon, tags: Vec::new() }
}

/* ──────────────────────────────────────────────────────────────────────────
1) Roles
────────────────────────────────────────────────────────────────────────── */

#[test]
fn roles_follow_element_relation_and_polarity() {
    assert_eq!(Relation::between(Element::Wood, Element::Fire), Relation::Output);
    assert_eq!(Relation::between(Element::Wood, Element::Metal), Relation::Authority);
    assert_eq!(Relation::between(Element::Wood, Element::Water), Relation::Resource);

    let dm = Stem::Jia;
    assert_eq!(Role::of(dm, Element::Wood, Polarity::Yang), Role::Peer);
    assert_eq!(Role::of(dm, Element::Wood, Polarity::Yin), Role::RobWealth);
    assert_eq!(Role::of(dm, Element::Earth, Polarity::Yin), Role::DirectWealth);
    assert_eq!(Role::of(dm, Element::Metal, Polarity::Yang), Role::SevenKillings);
    assert_eq!(Role::of(dm, Element::Fire, Polarity::Yin), Role::HurtingOfficer);
    for r in Role::ALL {
        assert_eq!(Role::of(dm, element_of(r.relation(), dm), Polarity::Yang).relation(), r.relation());
    }
}

fn element_of(r: Relation, dm: Stem) -> Element {
    let e = dm.element();
    match r {
        Relation::Same => e,
        Relation::Output => e.generates(),
        Relation::Wealth => e.destroys(),
        Relation::Authority => e.destroyed_by(),
        Relation::Resource => e.generated_by(),
    }
}

#[test]
fn zero_energy_strength_is_a_zero_sentinel() {
    let s = score::strength(&RelationEnergies::default(), &Config::default());
    assert_eq!(s.ratio, 0.0);
    assert!(!s.strong);

    let s = score::strength(&rel(3.0, 1.0, 1.0, 1.0, 2.0), &Config::default());
    assert!((s.ratio - 5.0 / 8.0).abs() < 1e-12);
    assert!(s.strong);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Structure rules
────────────────────────────────────────────────────────────────────────── */

#[test]
fn robbery_exemption_ladder() {
    let rc = Config::default().score.rules;
    let mediated = apply_rules(&rel(6.0, 4.5, 2.0, 0.0, 0.0), Some(Element::Wood), &rc);
    let exposed = apply_rules(&rel(6.0, 0.0, 2.0, 2.0, 0.0), Some(Element::Wood), &rc);

    let m = mediated.robbery.expect("robbery fires");
    let x = exposed.robbery.expect("robbery fires");
    assert!(
        m.wealth_penalty < x.wealth_penalty,
        "mediated {} must be below exposed {}",
        m.wealth_penalty,
        x.wealth_penalty
    );
    assert_eq!(m.exemptions, [Exemption::Mediation]);
    assert_eq!(x.wealth_penalty, rc.robbery_wealth_penalty);
    assert!(x.exemptions.is_empty());

    let partial = apply_rules(&rel(6.0, 3.0, 2.0, 0.0, 0.0), Some(Element::Wood), &rc)
        .robbery
        .expect("robbery fires");
    assert_eq!(partial.factor, 0.5);
    assert_eq!(partial.wealth_penalty, 0.5 * rc.robbery_wealth_penalty);

    let shielded = apply_rules(&rel(6.0, 0.0, 2.0, 3.0, 0.0), Some(Element::Wood), &rc)
        .robbery
        .expect("robbery fires");
    assert_eq!(shielded.exemptions, [Exemption::Shield]);
    assert_eq!(shielded.wealth_penalty, 0.0);

    let earth = apply_rules(&rel(6.0, 0.0, 2.0, 0.0, 0.0), Some(Element::Earth), &rc)
        .robbery
        .expect("robbery fires");
    assert_eq!(earth.exemptions, [Exemption::Alliance]);
    assert_eq!(earth.wealth_penalty, 0.0);
}

#[test]
fn robbery_ladder_holds_when_wealth_outweighs_self() {
    let rc = Config::default().score.rules;
    let mediated = apply_rules(&rel(6.0, 4.5, 7.0, 0.0, 0.0), Some(Element::Wood), &rc)
        .robbery
        .expect("robbery fires");
    let exposed = apply_rules(&rel(6.0, 0.0, 7.0, 2.0, 0.0), Some(Element::Wood), &rc)
        .robbery
        .expect("robbery fires");
    assert!(mediated.wealth_penalty < exposed.wealth_penalty);
    assert_eq!(exposed.wealth_penalty, rc.robbery_wealth_penalty);

    let quiet = apply_rules(&rel(5.0, 0.0, 7.0, 0.0, 0.0), Some(Element::Wood), &rc);
    assert!(quiet.robbery.is_none());
}

#[test]
fn mutiny_blocks_conversion() {
    let rc = Config::default().score.rules;
    let weak = apply_rules(&rel(2.0, 5.0, 0.0, 5.0, 0.0), None, &rc);
    assert!(weak.mutiny && !weak.conversion);
    assert_eq!(weak.deltas.career, -rc.mutiny_penalty);

    let strong = apply_rules(&rel(6.0, 5.0, 0.0, 5.0, 0.0), None, &rc);
    assert!(!strong.mutiny && strong.conversion);
    assert_eq!(strong.deltas.career, rc.conversion_bonus);
}

#[test]
fn weak_self_cannot_carry_heavy_wealth() {
    let rc = Config::default().score.rules;
    let out = apply_rules(&rel(1.0, 0.0, 7.0, 0.0, 0.0), None, &rc);
    assert!(out.burden);
    assert_eq!(out.deltas.wealth, -rc.burden_penalty);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Aggregate
────────────────────────────────────────────────────────────────────────── */

#[test]
fn skull_overrides_every_other_marker() {
    let cfg = Config::default();
    let reports = [
        report("treasury", ScoreBundle::new(7.5, 15.0, 0.0), Some(Icon::Trophy)),
        report("skull", ScoreBundle::new(-1.0, -1.0, -1.0), Some(Icon::Skull)),
        report("harmony", ScoreBundle::new(8.0, 4.0, 4.0), Some(Icon::Handshake)),
    ];
    let card = score::aggregate(&RelationEnergies::default(), None, &reports, &cfg);
    assert_eq!(card.icon, Some(Icon::Skull));
    assert_eq!(card.outlook, Outlook::Collapse);
}

#[test]
fn outlook_follows_net_delta_against_margin() {
    let cfg = Config::default();
    let zero = RelationEnergies::default();
    let up = [report("harmony", ScoreBundle::new(4.0, 2.0, 2.0), Some(Icon::Handshake))];
    let down = [report("harmony", ScoreBundle::new(-4.0, -2.0, -2.0), Some(Icon::Lightning))];
    let flat = [report("harmony", ScoreBundle::new(1.0, 0.0, 0.0), None)];
    assert_eq!(score::aggregate(&zero, None, &up, &cfg).outlook, Outlook::Opportunity);
    assert_eq!(score::aggregate(&zero, None, &down, &cfg).outlook, Outlook::Risk);
    assert_eq!(score::aggregate(&zero, None, &flat, &cfg).outlook, Outlook::Neutral);
}

#[test]
fn scores_are_clamped_to_the_unit_range() {
    let cfg = Config::default();
    let reports = [report("x", ScoreBundle::new(80.0, -80.0, 0.0), None)];
    let card = score::aggregate(&RelationEnergies::default(), None, &reports, &cfg);
    assert_eq!(card.scores, ScoreBundle::new(100.0, 0.0, cfg.score.baseline));
    assert_eq!(card.base, ScoreBundle::new(50.0, 50.0, 50.0));
}

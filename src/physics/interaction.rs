//! Interaction detector: trines first, then pairs.
//!
//! Pairs of the same self-punishing symbol register as self-punishment;
//! every other pair is checked independently for half-trine, combination,
//! clash, harm and punishment.
//!
//! A completed trine absorbs its three symbol pairs into a processed set so
//! none of them can register again as a half-trine, clash or punishment in
//! the same pass. Rules can be disabled by key; a disabled rule is still
//! reported (with `applied = false`) but leaves the particles untouched.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::mechanics::energy::lose;
use crate::physics::particle::{Origin, Particle, Status};
use crate::symbols::{Branch, Element, TRINES};

/// Rule keys whose numeric effect should be skipped.
pub type DisabledRules = BTreeSet<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Trine,
    HalfTrine,
    SixCombination,
    SixClash,
    Punishment,
    SelfPunishment,
    SixHarm,
}

impl InteractionKind {
    pub fn label(self) -> &'static str {
        match self {
            InteractionKind::Trine => "trine",
            InteractionKind::HalfTrine => "half_trine",
            InteractionKind::SixCombination => "combination",
            InteractionKind::SixClash => "clash",
            InteractionKind::Punishment => "punishment",
            InteractionKind::SelfPunishment => "self_punishment",
            InteractionKind::SixHarm => "harm",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable lookup key: `trine:water`, `clash:zi-wu`, `punishment:chou-xu-wei`.
///
/// Trines are keyed by their target element; everything else by the
/// participating symbols in branch order.
pub fn rule_key(kind: InteractionKind, symbols: &[Branch], target: Option<Element>) -> String {
    if let (InteractionKind::Trine, Some(e)) = (kind, target) {
        return format!("trine:{e}");
    }
    let mut sorted: Vec<Branch> = symbols.to_vec();
    sorted.sort();
    sorted.dedup();
    let names: Vec<&str> = sorted.iter().map(|b| b.name()).collect();
    format!("{kind}:{}", names.join("-"))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub participants: Vec<String>,
    pub symbols: Vec<Branch>,
    pub target: Option<Element>,
    /// Amplitude change per participant id.
    pub deltas: Vec<(String, f64)>,
    pub applied: bool,
}

impl InteractionEvent {
    pub fn rule_key(&self) -> String {
        rule_key(self.kind, &self.symbols, self.target)
    }

    /// Whether the event involves both symbols.
    pub fn involves(&self, a: Branch, b: Branch) -> bool {
        self.symbols.contains(&a) && self.symbols.contains(&b)
    }
}

#[inline]
fn pair(a: Branch, b: Branch) -> (Branch, Branch) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Scan branch particles (natal and luck-cycle; the annual layer is handled
/// by the propagator's spacetime stage) and apply every detected effect.
pub fn detect(
    particles: &mut [Particle],
    cfg: &Config,
    disabled: &DisabledRules,
) -> Vec<InteractionEvent> {
    let st = &cfg.structure;
    let mut events = Vec::new();

    let candidates: Vec<(usize, Branch)> = particles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.origin != Origin::Annual)
        .filter_map(|(i, p)| p.branch().map(|b| (i, b)))
        .collect();
    let present: HashSet<Branch> = candidates.iter().map(|&(_, b)| b).collect();
    let mut processed: HashSet<(Branch, Branch)> = HashSet::new();

    // phase 1: complete trines
    for group in TRINES.iter() {
        if !group.members.iter().all(|m| present.contains(m)) {
            continue;
        }
        let [a, b, c] = group.members;
        processed.extend([pair(a, b), pair(a, c), pair(b, c)]);

        let members: Vec<usize> = candidates
            .iter()
            .filter(|(_, br)| group.members.contains(br))
            .map(|&(i, _)| i)
            .collect();
        let target = group.element;
        fire(
            particles,
            &members,
            InteractionKind::Trine,
            group.members.to_vec(),
            Some(target),
            disabled,
            &mut events,
            |p| {
                let pre = p.amplitude();
                p.wave.collapse_toward(target, st.trine_collapse);
                p.wave.add_amplitude(pre * st.trine_boost);
                p.tag(Status::Trine(target));
                pre * st.trine_boost
            },
        );
    }

    // phase 2: pairs not absorbed by a trine
    for (x, &(i, a)) in candidates.iter().enumerate() {
        for &(j, b) in candidates.iter().skip(x + 1) {
            let members = [i, j];
            if a == b {
                if a.self_punishing() {
                    fire(
                        particles,
                        &members,
                        InteractionKind::SelfPunishment,
                        vec![a, b],
                        None,
                        disabled,
                        &mut events,
                        |p| {
                            let pre = p.amplitude();
                            p.wave.set_amplitude(lose(pre, st.punish_loss));
                            p.wave.add_entropy(st.punish_entropy);
                            p.tag(Status::ShearStress);
                            p.amplitude() - pre
                        },
                    );
                }
                continue;
            }
            if processed.contains(&pair(a, b)) {
                continue;
            }

            if let Some(target) = a.half_trine(b) {
                fire(
                    particles,
                    &members,
                    InteractionKind::HalfTrine,
                    vec![a, b],
                    Some(target),
                    disabled,
                    &mut events,
                    |p| {
                        let pre = p.amplitude();
                        p.wave.collapse_toward(target, st.half_trine_collapse);
                        p.wave.add_amplitude(pre * st.half_trine_boost);
                        p.tag(Status::HalfTrine);
                        pre * st.half_trine_boost
                    },
                );
            }

            if let Some(target) = a.six_combination(b) {
                fire(
                    particles,
                    &members,
                    InteractionKind::SixCombination,
                    vec![a, b],
                    Some(target),
                    disabled,
                    &mut events,
                    |p| {
                        let pre = p.amplitude();
                        p.wave.collapse_toward(target, st.combo_collapse);
                        p.wave.add_amplitude(pre * st.combo_boost);
                        p.tag(Status::Combined);
                        pre * st.combo_boost
                    },
                );
            }

            if a.clashes(b) {
                fire(
                    particles,
                    &members,
                    InteractionKind::SixClash,
                    vec![a, b],
                    None,
                    disabled,
                    &mut events,
                    |p| {
                        let pre = p.amplitude();
                        p.wave.set_amplitude(lose(pre, st.clash_loss));
                        p.wave.add_entropy(st.clash_entropy);
                        p.tag(Status::Ruptured);
                        p.amplitude() - pre
                    },
                );
            }

            if a.harms(b) {
                fire(
                    particles,
                    &members,
                    InteractionKind::SixHarm,
                    vec![a, b],
                    None,
                    disabled,
                    &mut events,
                    |p| {
                        let pre = p.amplitude();
                        p.wave.set_amplitude(lose(pre, st.harm_loss));
                        p.wave.add_entropy(st.harm_entropy);
                        p.tag(Status::Harmed);
                        p.amplitude() - pre
                    },
                );
            }

            if a.punishes(b) {
                fire(
                    particles,
                    &members,
                    InteractionKind::Punishment,
                    vec![a, b],
                    None,
                    disabled,
                    &mut events,
                    |p| {
                        let pre = p.amplitude();
                        p.wave.set_amplitude(lose(pre, st.punish_loss));
                        p.wave.add_entropy(st.punish_entropy);
                        p.tag(Status::ShearStress);
                        p.amplitude() - pre
                    },
                );
            }
        }
    }

    events
}

#[allow(clippy::too_many_arguments)]
fn fire(
    particles: &mut [Particle],
    members: &[usize],
    kind: InteractionKind,
    symbols: Vec<Branch>,
    target: Option<Element>,
    disabled: &DisabledRules,
    events: &mut Vec<InteractionEvent>,
    mut effect: impl FnMut(&mut Particle) -> f64,
) {
    let key = rule_key(kind, &symbols, target);
    let applied = !disabled.contains(&key);
    let mut deltas = Vec::with_capacity(members.len());
    if applied {
        for &k in members {
            let p = &mut particles[k];
            let d = effect(p);
            deltas.push((p.id.clone(), d));
        }
    }
    debug!(rule = %key, applied, participants = members.len(), "interaction");
    events.push(InteractionEvent {
        kind,
        participants: members.iter().map(|&k| particles[k].id.clone()).collect(),
        symbols,
        target,
        deltas,
        applied,
    });
}

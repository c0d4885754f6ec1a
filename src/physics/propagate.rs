//! Energy propagator: rooting, flow graph, spacetime injection.
//!
//! Stages always run in that order. Every stage only ever touches the
//! particles it is handed; an empty set propagates to a zero spectrum.

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::config::Config;
use crate::mechanics::energy::floor_zero;
use crate::physics::particle::{Origin, Particle, Status};
use crate::symbols::Element;

/// Accumulated energy per element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementSpectrum(pub [f64; 5]);

impl ElementSpectrum {
    pub fn of(particles: &[Particle]) -> Self {
        let mut acc = [0.0; 5];
        for p in particles {
            for (slot, e) in acc.iter_mut().zip(p.wave.energy()) {
                *slot += e;
            }
        }
        Self(acc)
    }

    #[inline]
    pub fn get(&self, e: Element) -> f64 {
        self.0[e.index()]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Serialize for ElementSpectrum {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut m = s.serialize_map(Some(5))?;
        for e in Element::ALL {
            m.serialize_entry(e.label(), &self.get(e))?;
        }
        m.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RootRecord {
    pub stem: String,
    pub element: Element,
    pub best_share: f64,
    pub transmitted: f64,
    pub rooted: bool,
    pub high_intensity: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub sent: f64,
    pub delivered: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpacetimeRecord {
    /// Luck particle that closed a generation gap.
    pub repaired_by: Option<String>,
    pub activated: Vec<String>,
    pub broken: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PropagationTrace {
    pub spectrum: ElementSpectrum,
    pub roots: Vec<RootRecord>,
    pub edges: Vec<FlowEdge>,
    pub chains: Vec<[String; 3]>,
    pub focus: Option<String>,
    pub spacetime: SpacetimeRecord,
}

pub fn propagate(particles: &mut [Particle], cfg: &Config) -> PropagationTrace {
    let mut tr = PropagationTrace { roots: root(particles, cfg), ..Default::default() };
    flow(particles, cfg, &mut tr);
    tr.spacetime = spacetime(particles, cfg);
    tr.spectrum = ElementSpectrum::of(particles);
    tr
}

/* ──────────────────────────────────────────────────────────────────────────
Stage 1: rooting
────────────────────────────────────────────────────────────────────────── */

fn root(particles: &mut [Particle], cfg: &Config) -> Vec<RootRecord> {
    let fl = &cfg.flow;
    let branches: Vec<(f64, [f64; 5])> = particles
        .iter()
        .filter(|p| p.branch().is_some())
        .map(|p| (p.amplitude(), *p.wave.shares()))
        .collect();

    let mut out = Vec::new();
    for p in particles.iter_mut().filter(|p| p.is_natal() && p.stem().is_some()) {
        let e = p.element();
        let mut best = 0.0_f64;
        let mut transmitted = 0.0;
        for (amp, shares) in &branches {
            let share = shares[e.index()];
            best = best.max(share);
            transmitted += share * amp * fl.root_transfer;
        }

        let rooted = best >= fl.root_threshold;
        let high = rooted && transmitted >= fl.high_intensity;
        if rooted {
            p.wave.set_amplitude((fl.root_floor + transmitted) * p.vitality());
            p.tag(Status::Rooted);
            if high {
                p.tag(Status::HighIntensity);
            }
        } else {
            p.tag(Status::VirtualImage);
        }
        debug!(stem = %p.id, best, transmitted, rooted, "rooting");
        out.push(RootRecord {
            stem: p.id.clone(),
            element: e,
            best_share: best,
            transmitted,
            rooted,
            high_intensity: high,
        });
    }
    out
}

/* ──────────────────────────────────────────────────────────────────────────
Stage 2: flow graph
────────────────────────────────────────────────────────────────────────── */

fn flow(particles: &mut [Particle], cfg: &Config, tr: &mut PropagationTrace) {
    let fl = &cfg.flow;
    let n = particles.len();
    let snap: Vec<f64> = particles.iter().map(|p| p.amplitude()).collect();
    let dom: Vec<Element> = particles.iter().map(|p| p.wave.dominant()).collect();

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in 0..n {
            if i != j && dom[i].generates() == dom[j] {
                adj[i].push(j);
            }
        }
    }

    let mut sent = vec![0.0; n];
    let mut received = vec![0.0; n];
    for (i, targets) in adj.iter().enumerate() {
        if targets.is_empty() {
            continue;
        }
        let mut per_edge = fl.rate.max(0.0) * snap[i];
        let total = per_edge * targets.len() as f64;
        if total > snap[i] && total > 0.0 {
            per_edge *= snap[i] / total;
        }
        for &j in targets {
            let eff = if particles[i].adjacent(&particles[j]) {
                fl.adjacent_efficiency
            } else {
                fl.remote_efficiency
            };
            let delivered = per_edge * eff;
            sent[i] += per_edge;
            received[j] += delivered;
            trace!(from = %particles[i].id, to = %particles[j].id, delivered, "flow edge");
            tr.edges.push(FlowEdge {
                from: particles[i].id.clone(),
                to: particles[j].id.clone(),
                sent: per_edge,
                delivered,
            });
        }
    }
    for (k, p) in particles.iter_mut().enumerate() {
        p.wave.set_amplitude(floor_zero(snap[k] - sent[k] + received[k]));
    }

    // length-2 chains a → b → c, a ≠ c
    let mut terminals = BTreeSet::new();
    for (a, mids) in adj.iter().enumerate() {
        for &b in mids {
            for &c in &adj[b] {
                if c != a {
                    tr.chains.push([
                        particles[a].id.clone(),
                        particles[b].id.clone(),
                        particles[c].id.clone(),
                    ]);
                    terminals.insert(c);
                }
            }
        }
    }
    for c in terminals {
        let p = &mut particles[c];
        p.wave.scale(fl.chain_bonus);
        p.tag(Status::ChainTerminal);
    }

    let mut focus: Option<(usize, f64)> = None;
    for k in 0..n {
        let net = received[k] - sent[k];
        if focus.is_none_or(|(_, best)| net > best) {
            focus = Some((k, net));
        }
    }
    if let Some((k, net)) = focus.filter(|&(_, net)| net > fl.focus_threshold) {
        particles[k].tag(Status::SystemFocus);
        debug!(focus = %particles[k].id, net, "system focus");
        tr.focus = Some(particles[k].id.clone());
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Stage 3: spacetime (luck cycle and annual pulse)
────────────────────────────────────────────────────────────────────────── */

fn spacetime(particles: &mut [Particle], cfg: &Config) -> SpacetimeRecord {
    let sp = &cfg.spacetime;
    let mut rec = SpacetimeRecord::default();

    let natal: BTreeSet<Element> = particles
        .iter()
        .filter(|p| p.is_natal())
        .map(|p| p.element())
        .collect();

    // a luck particle whose element the chart lacks, between a mother and a
    // child the chart has
    let bridge = particles.iter().position(|p| {
        p.origin == Origin::Luck && {
            let e = p.element();
            !natal.contains(&e)
                && natal.contains(&e.generated_by())
                && natal.contains(&e.generates())
        }
    });
    if let Some(k) = bridge {
        for p in particles.iter_mut() {
            p.wave.scale(sp.repair_multiplier);
        }
        particles[k].tag(Status::Repaired);
        debug!(luck = %particles[k].id, "structural repair");
        rec.repaired_by = Some(particles[k].id.clone());
    }

    let annual_stem = particles
        .iter()
        .filter(|p| p.origin == Origin::Annual)
        .find_map(|p| p.stem());
    let annual_branch = particles
        .iter()
        .filter(|p| p.origin == Origin::Annual)
        .find_map(|p| p.branch());

    for p in particles.iter_mut().filter(|p| p.is_natal()) {
        let Some(b) = p.branch() else { continue };
        if let Some(s) = annual_stem {
            if b.hides(s.element()) {
                p.wave.scale(sp.activation_boost);
                p.tag(Status::Activated);
                rec.activated.push(p.id.clone());
            }
        }
        if let Some(ab) = annual_branch {
            if ab.clashes(b) {
                p.wave.scale(sp.annual_clash_multiplier);
                p.wave.add_entropy(sp.clash_entropy);
                p.tag(Status::StructureBroken);
                debug!(victim = %p.id, annual = %ab, "annual clash breaks structure");
                rec.broken.push(p.id.clone());
            }
        }
    }

    rec
}

//! Treasury engine: the four earth vaults and their annual keys.
//!
//! A vault (chen, xu, chou, wei) is struck open by its clash partner, or,
//! when `punishment_opens` is set, by a punishment partner at reduced
//! strength. A strong day master collects the release ("vault"); a weak
//! one is buried by it ("tomb"). Only the first matching vault in pillar
//! order is processed.

use serde::Serialize;
use tracing::debug;

use crate::chart::{Chart, Pillar};
use crate::config::{Config, TreasuryConfig};
use crate::symbols::{Branch, Element};
use crate::systems::sdk::{Engine, EngineInput, EngineReport, Icon, ScoreBundle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Clash,
    Punishment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Vault,
    Tomb,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VaultHit {
    pub pillar: Pillar,
    pub vault: Branch,
    pub stored: Element,
    pub key: Branch,
    pub via: KeyKind,
}

/// Branches that open `vault` through punishment.
fn punishment_keys(vault: Branch) -> &'static [Branch] {
    match vault {
        Branch::Chou => &[Branch::Xu, Branch::Wei],
        Branch::Xu => &[Branch::Chou, Branch::Wei],
        Branch::Wei => &[Branch::Chou, Branch::Xu],
        Branch::Chen => &[Branch::Chen],
        _ => &[],
    }
}

#[derive(Clone, Debug)]
pub struct TreasuryEngine {
    cfg: TreasuryConfig,
}

impl TreasuryEngine {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.treasury.clone() }
    }

    /// First vault in year → hour order that `key` opens.
    pub fn find_vault(&self, chart: &Chart, key: Branch) -> Option<VaultHit> {
        chart.branches().find_map(|(pillar, vault)| {
            let stored = vault.vault_element()?;
            let via = if vault.clash_partner() == key {
                KeyKind::Clash
            } else if self.cfg.punishment_opens && punishment_keys(vault).contains(&key) {
                KeyKind::Punishment
            } else {
                return None;
            };
            Some(VaultHit { pillar, vault, stored, key, via })
        })
    }
}

impl Engine for TreasuryEngine {
    fn name(&self) -> &'static str {
        "treasury"
    }

    fn evaluate(&self, input: &EngineInput<'_>) -> EngineReport {
        let mut rep = EngineReport::empty(self.name());
        let Some(key) = input.annual_branch() else { return rep };
        let Some(hit) = self.find_vault(input.chart, key) else { return rep };

        let c = &self.cfg;
        let strength = match hit.via {
            KeyKind::Clash => 1.0,
            KeyKind::Punishment => c.punishment_factor,
        };
        // the vault holds wealth when its element is what the day master destroys
        let wealth_vault = input
            .chart
            .day_master()
            .is_some_and(|dm| dm.element().destroys() == hit.stored);
        let verdict = if input.day_master_strong { Verdict::Vault } else { Verdict::Tomb };

        match verdict {
            Verdict::Vault => {
                let energy = c.vault_energy * c.bonus_multiplier * strength;
                if wealth_vault {
                    rep.deltas = ScoreBundle::new(energy * c.career_share, energy, 0.0);
                    rep.icon = Some(Icon::Trophy);
                } else {
                    rep.deltas =
                        ScoreBundle::new(energy * c.general_career, energy * c.general_wealth, 0.0);
                    rep.icon = Some(Icon::Key);
                }
            }
            Verdict::Tomb => {
                let loss = c.vault_energy * c.break_penalty * strength;
                rep.deltas = ScoreBundle::new(-loss * c.career_share, -loss, 0.0);
                rep.icon = Some(Icon::Tomb);
            }
        }

        let kind = if wealth_vault { "wealth" } else { "general" };
        let label = match verdict {
            Verdict::Vault => "vault_open",
            Verdict::Tomb => "tomb_collapse",
        };
        rep.tags.push(format!("{label}:{kind}:{}", hit.vault));
        debug!(vault = %hit.vault, key = %hit.key, ?verdict, wealth_vault, "treasury");
        rep
    }
}

//! The configuration tree: every tunable number in the kernel.
//!
//! One immutable [`Config`] value is handed by reference to each component.
//! Reconfiguring produces a *new* value (`merged`, `with_section`, `set`);
//! dependents are rebuilt from it rather than mutated in place.
//!
//! Every section is `#[serde(default)]`, so a partial JSON document only
//! overrides what it names and every other read falls back to the defaults
//! below. Unknown keys are rejected so a typo never silently no-ops.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::chart::Pillar;
use crate::error::{self, Error, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub physics: PhysicsConfig,
    pub structure: StructureConfig,
    pub flow: FlowConfig,
    pub spacetime: SpacetimeConfig,
    pub treasury: TreasuryConfig,
    pub skull: SkullConfig,
    pub harmony: HarmonyConfig,
    pub score: ScoreConfig,
    pub macro_env: MacroConfig,
}

/// Particle construction and health.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    pub branch_base: f64,
    pub position_weights: PositionWeights,
    /// Amplitude of an unrooted stem.
    pub stem_virtual: f64,
    pub luck_amplitude: f64,
    pub annual_amplitude: f64,
    /// Broken particles ending a pass below this amplitude lose health.
    pub survival_floor: f64,
    pub health_damage: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            branch_base: 2.0,
            position_weights: PositionWeights::default(),
            stem_virtual: 0.5,
            luck_amplitude: 3.0,
            annual_amplitude: 4.0,
            survival_floor: 1.0,
            health_damage: 25.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PositionWeights {
    pub year: f64,
    pub month: f64,
    pub day: f64,
    pub hour: f64,
}

impl Default for PositionWeights {
    fn default() -> Self {
        Self { year: 1.0, month: 1.5, day: 1.2, hour: 0.9 }
    }
}

impl PositionWeights {
    pub fn for_pillar(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Year => self.year,
            Pillar::Month => self.month,
            Pillar::Day => self.day,
            Pillar::Hour => self.hour,
        }
    }
}

/// Interaction detector strengths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureConfig {
    pub trine_boost: f64,
    pub trine_collapse: f64,
    pub half_trine_boost: f64,
    pub half_trine_collapse: f64,
    pub combo_boost: f64,
    pub combo_collapse: f64,
    pub clash_loss: f64,
    pub clash_entropy: f64,
    /// Shared by pair punishments and self-punishment.
    pub punish_loss: f64,
    pub punish_entropy: f64,
    pub harm_loss: f64,
    pub harm_entropy: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            trine_boost: 0.5,
            trine_collapse: 0.8,
            half_trine_boost: 0.2,
            half_trine_collapse: 0.4,
            combo_boost: 0.1,
            combo_collapse: 0.3,
            clash_loss: 0.3,
            clash_entropy: 0.5,
            punish_loss: 0.15,
            punish_entropy: 0.2,
            harm_loss: 0.1,
            harm_entropy: 0.1,
        }
    }
}

/// Rooting and flow-graph constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowConfig {
    pub root_threshold: f64,
    pub root_floor: f64,
    pub root_transfer: f64,
    pub high_intensity: f64,
    pub rate: f64,
    pub adjacent_efficiency: f64,
    pub remote_efficiency: f64,
    pub chain_bonus: f64,
    pub focus_threshold: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            root_threshold: 0.3,
            root_floor: 1.5,
            root_transfer: 0.5,
            high_intensity: 3.0,
            rate: 0.08,
            adjacent_efficiency: 1.0,
            remote_efficiency: 0.7,
            chain_bonus: 1.1,
            focus_threshold: 0.3,
        }
    }
}

/// Luck-cycle and annual injection rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpacetimeConfig {
    pub repair_multiplier: f64,
    pub activation_boost: f64,
    pub annual_clash_multiplier: f64,
    pub clash_entropy: f64,
}

impl Default for SpacetimeConfig {
    fn default() -> Self {
        Self {
            repair_multiplier: 1.05,
            activation_boost: 1.2,
            annual_clash_multiplier: 0.4,
            clash_entropy: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreasuryConfig {
    /// Punishment partners also open a vault, at `punishment_factor`.
    pub punishment_opens: bool,
    pub vault_energy: f64,
    pub bonus_multiplier: f64,
    pub punishment_factor: f64,
    /// Career share of a wealth-vault release.
    pub career_share: f64,
    pub general_career: f64,
    pub general_wealth: f64,
    pub break_penalty: f64,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            punishment_opens: false,
            vault_energy: 10.0,
            bonus_multiplier: 1.5,
            punishment_factor: 0.6,
            career_share: 0.5,
            general_career: 0.6,
            general_wealth: 0.4,
            break_penalty: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkullConfig {
    pub terminal_penalty: f64,
    pub three_penalty: f64,
    pub pair_penalty: f64,
    pub self_penalty: f64,
    pub clash_each: f64,
    pub harm_each: f64,
    pub domain_split: DomainWeights,
}

impl Default for SkullConfig {
    fn default() -> Self {
        Self {
            terminal_penalty: 25.0,
            three_penalty: 15.0,
            pair_penalty: 8.0,
            self_penalty: 5.0,
            clash_each: 4.0,
            harm_each: 2.0,
            domain_split: DomainWeights { career: 1.0, wealth: 0.6, relationship: 0.8 },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainWeights {
    pub career: f64,
    pub wealth: f64,
    pub relationship: f64,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self { career: 1.0, wealth: 1.0, relationship: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarmonyConfig {
    pub trine_bonus: f64,
    pub half_trine_bonus: f64,
    pub combo_bonus: f64,
    pub clash_penalty: f64,
    /// Paid per clash instead of `clash_penalty` when any fusion is present.
    pub resolution_cost: f64,
    pub five_combo_bonus: f64,
    pub day_clash_relationship: f64,
}

impl Default for HarmonyConfig {
    fn default() -> Self {
        Self {
            trine_bonus: 8.0,
            half_trine_bonus: 4.0,
            combo_bonus: 5.0,
            clash_penalty: 10.0,
            resolution_cost: 2.0,
            five_combo_bonus: 3.0,
            day_clash_relationship: 6.0,
        }
    }
}

/// Linear weights over the five relations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelationWeights {
    #[serde(rename = "self")]
    pub self_: f64,
    pub output: f64,
    pub wealth: f64,
    pub authority: f64,
    pub resource: f64,
}

impl Default for RelationWeights {
    fn default() -> Self {
        Self { self_: 0.0, output: 0.0, wealth: 0.0, authority: 0.0, resource: 0.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    pub baseline: f64,
    pub career: RelationWeights,
    pub wealth: RelationWeights,
    pub relationship: RelationWeights,
    /// (self + resource) / total at or above this is a strong day master.
    pub strong_threshold: f64,
    pub rules: RuleConfig,
    pub outlook_margin: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            baseline: 50.0,
            career: RelationWeights {
                self_: 0.5,
                output: 0.8,
                wealth: 0.6,
                authority: 1.5,
                resource: 0.8,
            },
            wealth: RelationWeights {
                self_: -0.3,
                output: 1.0,
                wealth: 1.6,
                authority: 0.3,
                resource: 0.0,
            },
            relationship: RelationWeights {
                self_: -0.4,
                output: 0.3,
                wealth: 0.9,
                authority: 0.9,
                resource: 0.3,
            },
            strong_threshold: 0.45,
            rules: RuleConfig::default(),
            outlook_margin: 3.0,
        }
    }
}

/// Thresholds and magnitudes of the ordered structure rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    pub mutiny_self_below: f64,
    pub mutiny_output_above: f64,
    pub mutiny_authority_above: f64,
    pub mutiny_penalty: f64,
    pub conversion_self_above: f64,
    pub conversion_bonus: f64,
    pub burden_self_below: f64,
    pub burden_wealth_above: f64,
    pub burden_penalty: f64,
    pub robbery_self_above: f64,
    pub robbery_wealth_above: f64,
    pub robbery_wealth_penalty: f64,
    pub robbery_relationship_penalty: f64,
    pub mediation_full: f64,
    pub mediation_partial: f64,
    pub shield: f64,
    /// Penalty factor kept under the earth alliance exemption.
    pub alliance_factor: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            mutiny_self_below: 3.0,
            mutiny_output_above: 4.0,
            mutiny_authority_above: 4.0,
            mutiny_penalty: 10.0,
            conversion_self_above: 5.0,
            conversion_bonus: 6.0,
            burden_self_below: 2.0,
            burden_wealth_above: 6.0,
            burden_penalty: 12.0,
            robbery_self_above: 5.0,
            robbery_wealth_above: 1.0,
            robbery_wealth_penalty: 10.0,
            robbery_relationship_penalty: 6.0,
            mediation_full: 4.0,
            mediation_partial: 2.0,
            shield: 3.0,
            alliance_factor: 0.0,
        }
    }
}

/// Era / geographic modifiers applied to element energy before role mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacroConfig {
    /// Indexed by element order: wood, fire, earth, metal, water.
    pub element_modifiers: [f64; 5],
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self { element_modifiers: [1.0; 5] }
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Merge / path access
────────────────────────────────────────────────────────────────────────── */

impl Config {
    /// Parse a (possibly partial) JSON document on top of the defaults.
    pub fn from_json(s: &str) -> Result<Config> {
        let overrides: Value = serde_json::from_str(s)?;
        Config::default().merged(&overrides)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deep-merge `overrides` into a copy of this tree. Objects merge
    /// recursively, scalar leaves are replaced.
    pub fn merged(&self, overrides: &Value) -> Result<Config> {
        let mut base = self.to_value()?;
        merge_values(&mut base, overrides, "")?;
        Ok(serde_json::from_value(base)?)
    }

    /// Replace one section wholesale, e.g. `("treasury", json!({...}))`.
    /// Fields missing from `section` take their defaults.
    pub fn with_section(&self, name: &str, section: Value) -> Result<Config> {
        let mut base = self.to_value()?;
        let obj = base
            .as_object_mut()
            .ok_or_else(|| error::config("config root is not an object"))?;
        if !obj.contains_key(name) {
            return Err(Error::Config(format!("unknown section `{name}`")));
        }
        obj.insert(name.to_string(), section);
        Ok(serde_json::from_value(base)?)
    }

    /// Read a numeric leaf by dotted path (`"flow.rate"`).
    pub fn get(&self, path: &str) -> Result<f64> {
        let v = self.to_value()?;
        leaf(&v, path)?
            .as_f64()
            .ok_or_else(|| Error::NotNumeric(path.to_string()))
    }

    /// Copy with one numeric leaf replaced.
    pub fn set(&self, path: &str, value: f64) -> Result<Config> {
        self.set_many(&[(path, value)])
    }

    /// Copy with several numeric leaves replaced in one pass.
    pub fn set_many(&self, updates: &[(&str, f64)]) -> Result<Config> {
        let mut v = self.to_value()?;
        for (path, value) in updates {
            let slot = v
                .pointer_mut(&pointer(path))
                .ok_or_else(|| Error::UnknownParameter(path.to_string()))?;
            if !slot.is_number() {
                return Err(Error::NotNumeric(path.to_string()));
            }
            let n = Number::from_f64(*value).ok_or_else(|| Error::NotNumeric(path.to_string()))?;
            *slot = Value::Number(n);
        }
        Ok(serde_json::from_value(v)?)
    }
}

fn pointer(path: &str) -> String {
    let mut p = String::with_capacity(path.len() + 1);
    for seg in path.split('.') {
        p.push('/');
        p.push_str(seg);
    }
    p
}

fn leaf<'a>(v: &'a Value, path: &str) -> Result<&'a Value> {
    v.pointer(&pointer(path))
        .ok_or_else(|| Error::UnknownParameter(path.to_string()))
}

fn merge_values(base: &mut Value, overlay: &Value, at: &str) -> Result<()> {
    match (base, overlay) {
        (Value::Object(dst), Value::Object(src)) => merge_objects(dst, src, at),
        (slot, Value::Object(_)) => Err(Error::Config(format!(
            "`{at}` is a leaf ({slot}), cannot merge an object into it"
        ))),
        (slot, v) => {
            *slot = v.clone();
            Ok(())
        }
    }
}

fn merge_objects(dst: &mut Map<String, Value>, src: &Map<String, Value>, at: &str) -> Result<()> {
    for (k, v) in src {
        let path = if at.is_empty() { k.clone() } else { format!("{at}.{k}") };
        match dst.get_mut(k) {
            Some(slot) => merge_values(slot, v, &path)?,
            None => {
                warn!(key = %path, "rejecting unknown configuration key");
                return Err(Error::Config(format!("unknown key `{path}`")));
            }
        }
    }
    Ok(())
}

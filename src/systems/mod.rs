pub mod sdk;
#[cfg(feature = "engine-treasury")] pub mod treasury;
#[cfg(feature = "engine-skull")]    pub mod skull;
#[cfg(feature = "engine-harmony")]  pub mod harmony;
#[cfg(feature = "engine-luck")]     pub mod luck;

use crate::config::Config;
use sdk::Engine;

/// Every scoring engine enabled in this build, constructed from `cfg`.
#[allow(unused_variables)]
pub fn engines_from(cfg: &Config) -> Vec<Box<dyn Engine>> {
    #[allow(unused_mut)]
    let mut out: Vec<Box<dyn Engine>> = Vec::new();
    #[cfg(feature = "engine-treasury")]
    out.push(Box::new(treasury::TreasuryEngine::new(cfg)));
    #[cfg(feature = "engine-skull")]
    out.push(Box::new(skull::SkullEngine::new(cfg)));
    #[cfg(feature = "engine-harmony")]
    out.push(Box::new(harmony::HarmonyEngine::new(cfg)));
    out
}

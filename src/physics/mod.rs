//! The particle/field simulation: model, interaction detector, propagator.

pub mod interaction;
pub mod particle;
pub mod propagate;
pub mod wave;

pub use interaction::{DisabledRules, InteractionEvent, InteractionKind, detect, rule_key};
pub use particle::{HealthMap, Particle, ParticleState, Status, Token, build, settle_health};
pub use propagate::{ElementSpectrum, PropagationTrace, propagate};
pub use wave::Wave;

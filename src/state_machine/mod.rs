//! State machine module - Build, verify and simulate finite state machines

use crate::{Config, Result};

pub mod builder;
pub mod graph;
pub mod model;
pub mod simulator;
pub mod state;
pub mod transition;
pub mod verifier;

// Re-export key types
pub use builder::{GraphBuilder, merge};
pub use graph::{CycleAnalysis, GraphStats, TransitionGraph};
pub use model::{FsmModel, ModelMetadata};
pub use simulator::{
    GuardEvaluator, GuardOutcome, NamedGuards, SimulationStep, parse_events, simulate,
    simulate_with,
};
pub use state::{EventId, StateId};
pub use transition::{RawTransition, Transition, TransitionKey, TransitionSource};
pub use verifier::{MissingTransition, VerificationReport, Verifier};

/// Build a model from untrusted transitions using the configured builder
pub fn build_model(config: &Config, raw: Vec<RawTransition>, title: &str) -> Result<FsmModel> {
    GraphBuilder::new(&config.builder).build_raw(raw, title)
}

/// Verify a model using the configured verifier
pub fn verify_model(config: &Config, model: &FsmModel) -> VerificationReport {
    Verifier::new(&config.verifier).verify(model)
}

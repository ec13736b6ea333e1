//! Model verification
//!
//! Runs determinism, reachability, completeness and security heuristics over a
//! model. Findings are data: the verifier never fails, and degenerate graphs
//! downgrade to "no finding".
//!
//! Completeness is heuristic. Only the configured common events (by default
//! `error`, `reset`, `timeout`) are checked, and only those that appear
//! somewhere in the model. It is not alphabet completeness.

use crate::config::VerifierConfig;
use crate::state_machine::graph::{CycleAnalysis, TransitionGraph};
use crate::state_machine::{EventId, FsmModel, StateId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static RESTRICTED_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)unauthorized|denied").expect("valid regex"));

static RECOVERY_EVENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)auth|login").expect("valid regex"));

/// Prefix of every security warning
pub const SECURITY_WARNING_PREFIX: &str = "Security:";

/// Reason recorded for common events a state does not handle
pub const MISSING_COMMON_EVENT: &str = "Common event not handled";

/// A completeness gap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTransition {
    pub state: StateId,
    pub event: EventId,
    pub reason: String,
}

/// Verification findings for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub is_deterministic: bool,
    pub is_complete: bool,
    pub unreachable_states: Vec<StateId>,
    pub missing_transitions: Vec<MissingTransition>,
    /// Advisory findings; never block acceptance
    pub warnings: Vec<String>,
    /// Hard findings; callers may still accept the model but must surface them
    pub errors: Vec<String>,
    pub cycles: CycleAnalysis,
}

impl VerificationReport {
    pub fn security_warnings(&self) -> impl Iterator<Item = &str> {
        self.warnings
            .iter()
            .map(String::as_str)
            .filter(|w| w.starts_with(SECURITY_WARNING_PREFIX))
    }
}

/// Stateless verifier; holds only configuration
#[derive(Debug, Clone)]
pub struct Verifier {
    common_events: Vec<String>,
    cycle_warning_threshold: usize,
    max_cycle_search_steps: usize,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(&VerifierConfig::default())
    }
}

impl Verifier {
    pub fn new(config: &VerifierConfig) -> Self {
        Self {
            common_events: config.common_events.clone(),
            cycle_warning_threshold: config.cycle_warning_threshold,
            max_cycle_search_steps: config.max_cycle_search_steps,
        }
    }

    pub fn verify(&self, model: &FsmModel) -> VerificationReport {
        let graph = TransitionGraph::from_model(model);
        let mut warnings = Vec::new();

        let errors = check_determinism(model);

        let unreachable_states = find_unreachable(model, &graph);
        if !unreachable_states.is_empty() {
            let names: Vec<&str> = unreachable_states.iter().map(StateId::as_str).collect();
            warnings.push(format!("Unreachable states found: {}", names.join(", ")));
        }

        let missing_transitions = self.check_completeness(model);

        warnings.extend(check_recovery_paths(model));

        let cycles = graph.count_cycles(self.max_cycle_search_steps);
        if let Some(warning) = self.cycle_warning(cycles) {
            warnings.push(warning);
        }

        tracing::debug!(
            "Verified model {}: {} errors, {} warnings, {} gaps, cycles {:?}",
            model.id(),
            errors.len(),
            warnings.len(),
            missing_transitions.len(),
            cycles
        );

        VerificationReport {
            is_deterministic: errors.is_empty(),
            is_complete: missing_transitions.is_empty(),
            unreachable_states,
            missing_transitions,
            warnings,
            errors,
            cycles,
        }
    }

    fn check_completeness(&self, model: &FsmModel) -> Vec<MissingTransition> {
        let used: HashSet<&str> = model.transitions().iter().map(|t| t.event.as_str()).collect();
        let handled: HashSet<(&str, &str)> = model
            .transitions()
            .iter()
            .map(|t| (t.state.as_str(), t.event.as_str()))
            .collect();

        let mut seen = HashSet::new();
        let common: Vec<&str> = self
            .common_events
            .iter()
            .map(String::as_str)
            .filter(|e| used.contains(e) && seen.insert(*e))
            .collect();

        let mut missing = Vec::new();
        for state in model.states() {
            for &event in &common {
                if !handled.contains(&(state.as_str(), event)) {
                    // `event` came from a transition, so it is a valid identifier
                    if let Ok(event) = EventId::new(event) {
                        missing.push(MissingTransition {
                            state: state.clone(),
                            event,
                            reason: MISSING_COMMON_EVENT.to_string(),
                        });
                    }
                }
            }
        }
        missing
    }

    fn cycle_warning(&self, cycles: CycleAnalysis) -> Option<String> {
        match cycles {
            CycleAnalysis::Exact { count } if count > self.cycle_warning_threshold => Some(format!(
                "Found {} cycles in FSM - verify these are intentional",
                count
            )),
            CycleAnalysis::Exact { .. } => None,
            CycleAnalysis::Truncated { found, .. } if found > self.cycle_warning_threshold => {
                Some(format!(
                    "Found at least {} cycles in FSM - verify these are intentional",
                    found
                ))
            }
            CycleAnalysis::Truncated { found, budget } => {
                tracing::warn!("Cycle search gave up after {} steps", budget);
                Some(format!(
                    "Cycle search gave up after {} steps with {} cycles found; cycle count unknown",
                    budget, found
                ))
            }
        }
    }
}

/// One error per transition whose key was already seen
fn check_determinism(model: &FsmModel) -> Vec<String> {
    let mut seen = HashSet::new();
    model
        .transitions()
        .iter()
        .map(|t| t.key())
        .filter_map(|key| {
            let message = format!("Non-deterministic transition: {}", key);
            (!seen.insert(key)).then_some(message)
        })
        .collect()
}

/// Declared states not reachable from the initial state, in declaration order
fn find_unreachable(model: &FsmModel, graph: &TransitionGraph<'_>) -> Vec<StateId> {
    let reachable = graph.reachable_from_initial();
    model
        .states()
        .iter()
        .filter(|s| !reachable.contains(s))
        .cloned()
        .collect()
}

/// Restricted states entered without an auth/login transition out of them.
/// Warns once per state.
fn check_recovery_paths(model: &FsmModel) -> Vec<String> {
    let mut checked = HashSet::new();
    let mut warnings = Vec::new();

    for t in model.transitions() {
        let target = &t.next_state;
        if !RESTRICTED_STATE.is_match(target.as_str()) || !checked.insert(target) {
            continue;
        }

        let recovers = model
            .transitions()
            .iter()
            .any(|out| out.state == *target && RECOVERY_EVENT.is_match(out.event.as_str()));
        if !recovers {
            warnings.push(format!(
                "{} State '{}' may need an authentication recovery path",
                SECURITY_WARNING_PREFIX, target
            ));
        }
    }
    warnings
}

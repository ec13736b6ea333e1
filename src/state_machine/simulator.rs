//! Event replay
//!
//! [`simulate`] takes the first transition matching `(state, event)` in model
//! order and never evaluates guards: a guard is metadata only. Real guard
//! semantics are opt-in through [`simulate_with`] and a [`GuardEvaluator`].

use crate::error::{Error, Result};
use crate::state_machine::{EventId, FsmModel, StateId, Transition};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Action recorded when no transition matches
pub const NO_TRANSITION: &str = "NO_TRANSITION";

/// Tri-state guard result. Serialized as `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum GuardOutcome {
    Passed,
    Failed,
    NotApplicable,
}

impl From<Option<bool>> for GuardOutcome {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => GuardOutcome::Passed,
            Some(false) => GuardOutcome::Failed,
            None => GuardOutcome::NotApplicable,
        }
    }
}

impl From<GuardOutcome> for Option<bool> {
    fn from(value: GuardOutcome) -> Self {
        match value {
            GuardOutcome::Passed => Some(true),
            GuardOutcome::Failed => Some(false),
            GuardOutcome::NotApplicable => None,
        }
    }
}

/// One replayed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub current_state: StateId,
    pub event: EventId,
    pub next_state: StateId,
    pub action: String,
    pub guard_evaluated: GuardOutcome,
}

impl SimulationStep {
    pub fn is_stuck(&self) -> bool {
        self.action == NO_TRANSITION && self.current_state == self.next_state
    }
}

/// Evaluates guard expressions during [`simulate_with`]
pub trait GuardEvaluator {
    fn evaluate(&self, guard: &str, state: &StateId, event: &EventId) -> Result<bool>;
}

/// Guards decided by name
#[derive(Debug, Clone, Default)]
pub struct NamedGuards {
    values: HashMap<String, bool>,
    strict: bool,
}

impl NamedGuards {
    /// Listed guards hold, every other guard is false
    pub fn new<I, S>(satisfied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: satisfied.into_iter().map(|g| (g.into(), true)).collect(),
            strict: false,
        }
    }

    /// Only listed guards can be evaluated; any other guard is an error
    pub fn strict(values: HashMap<String, bool>) -> Self {
        Self {
            values,
            strict: true,
        }
    }
}

impl GuardEvaluator for NamedGuards {
    fn evaluate(&self, guard: &str, _state: &StateId, _event: &EventId) -> Result<bool> {
        match self.values.get(guard.trim()) {
            Some(&value) => Ok(value),
            None if self.strict => Err(Error::Guard {
                guard: guard.to_string(),
                message: "unknown guard".to_string(),
            }),
            None => Ok(false),
        }
    }
}

/// Parse untrusted event names, failing on the first empty one
pub fn parse_events<S: AsRef<str>>(events: &[S]) -> Result<Vec<EventId>> {
    events.iter().map(|e| EventId::new(e.as_ref())).collect()
}

/// Replay `events` with first-match semantics, ignoring guard truth.
///
/// `start` overrides the model's initial state when it names a declared state.
pub fn simulate(model: &FsmModel, events: &[EventId], start: Option<&StateId>) -> Vec<SimulationStep> {
    let lookup = TransitionLookup::new(model);
    let mut current = starting_state(model, start);
    let mut steps = Vec::with_capacity(events.len());

    for event in events {
        match lookup.first(current, event) {
            Some(t) => {
                steps.push(SimulationStep {
                    current_state: current.clone(),
                    event: event.clone(),
                    next_state: t.next_state.clone(),
                    action: t.action.clone(),
                    guard_evaluated: if t.guard.is_some() {
                        GuardOutcome::Passed
                    } else {
                        GuardOutcome::NotApplicable
                    },
                });
                current = &t.next_state;
            }
            None => steps.push(stuck(current, event)),
        }
    }

    steps
}

/// Replay `events`, taking the first transition whose guard holds.
///
/// Unguarded transitions always hold. If every candidate's guard is false the
/// step records no movement with a failed guard.
pub fn simulate_with(
    model: &FsmModel,
    events: &[EventId],
    start: Option<&StateId>,
    guards: &dyn GuardEvaluator,
) -> Result<Vec<SimulationStep>> {
    let lookup = TransitionLookup::new(model);
    let mut current = starting_state(model, start);
    let mut steps = Vec::with_capacity(events.len());

    for event in events {
        let mut selected = None;
        for &t in lookup.candidates(current, event) {
            match &t.guard {
                None => {
                    selected = Some((t, GuardOutcome::NotApplicable));
                    break;
                }
                Some(guard) => {
                    if guards.evaluate(guard, current, event)? {
                        selected = Some((t, GuardOutcome::Passed));
                        break;
                    }
                }
            }
        }

        match selected {
            Some((t, outcome)) => {
                steps.push(SimulationStep {
                    current_state: current.clone(),
                    event: event.clone(),
                    next_state: t.next_state.clone(),
                    action: t.action.clone(),
                    guard_evaluated: outcome,
                });
                current = &t.next_state;
            }
            None => steps.push(stuck(current, event)),
        }
    }

    Ok(steps)
}

fn starting_state<'a>(model: &'a FsmModel, start: Option<&'a StateId>) -> &'a StateId {
    match start {
        Some(state) if model.has_state(state) => state,
        Some(state) => {
            tracing::warn!(
                "Start state '{}' is not part of model {}, using '{}'",
                state,
                model.id(),
                model.initial_state()
            );
            model.initial_state()
        }
        None => model.initial_state(),
    }
}

fn stuck(current: &StateId, event: &EventId) -> SimulationStep {
    SimulationStep {
        current_state: current.clone(),
        event: event.clone(),
        next_state: current.clone(),
        action: NO_TRANSITION.to_string(),
        guard_evaluated: GuardOutcome::Failed,
    }
}

/// State, then event, to matching transitions in model order. Rebuilt per call.
struct TransitionLookup<'a> {
    by_state: HashMap<&'a str, HashMap<&'a str, Vec<&'a Transition>>>,
}

impl<'a> TransitionLookup<'a> {
    fn new(model: &'a FsmModel) -> Self {
        let mut by_state: HashMap<&'a str, HashMap<&'a str, Vec<&'a Transition>>> =
            HashMap::new();
        for t in model.transitions() {
            by_state
                .entry(t.state.as_str())
                .or_default()
                .entry(t.event.as_str())
                .or_default()
                .push(t);
        }
        Self { by_state }
    }

    fn candidates(&self, state: &StateId, event: &EventId) -> &[&'a Transition] {
        self.by_state
            .get(state.as_str())
            .and_then(|events| events.get(event.as_str()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn first(&self, state: &StateId, event: &EventId) -> Option<&'a Transition> {
        self.candidates(state, event).first().copied()
    }
}

/// Events the model can react to from `state`
pub fn enabled_events<'a>(model: &'a FsmModel, state: &StateId) -> Vec<&'a EventId> {
    let mut seen = HashSet::new();
    model
        .transitions()
        .iter()
        .filter(|t| t.state == *state && seen.insert(&t.event))
        .map(|t| &t.event)
        .collect()
}

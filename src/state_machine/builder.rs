//! Graph builder
//!
//! Derives the state set and initial state of a model from its transitions.
//! Every path that changes a model's transitions goes through [`GraphBuilder::derive`].

use crate::config::{BuilderConfig, EmptyModelPolicy};
use crate::error::{Error, Result};
use crate::state_machine::transition::validate_all;
use crate::state_machine::{FsmModel, RawTransition, StateId, Transition, TransitionKey};
use std::collections::HashSet;

/// Initial state used when there are no transitions to derive one from
pub const DEFAULT_INITIAL_STATE: &str = "initial";

/// Builds `FsmModel`s from transition lists
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    preferences: Vec<String>,
    empty_model: EmptyModelPolicy,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(&BuilderConfig::default())
    }
}

impl GraphBuilder {
    pub fn new(config: &BuilderConfig) -> Self {
        Self {
            preferences: config
                .initial_state_preferences
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect(),
            empty_model: config.empty_model,
        }
    }

    /// Build a model with a fresh id. The input is not modified.
    pub fn build(&self, transitions: &[Transition], title: impl Into<String>) -> Result<FsmModel> {
        let (states, initial_state) = self.derive(transitions, None)?;
        let model = FsmModel::from_parts(
            uuid::Uuid::new_v4().to_string(),
            title.into(),
            states,
            initial_state,
            transitions.to_vec(),
        );

        tracing::debug!(
            "Built model {} with {} states and {} transitions, initial state '{}'",
            model.id(),
            model.metadata().node_count,
            model.metadata().edge_count,
            model.initial_state()
        );
        Ok(model)
    }

    /// Validate untrusted transitions, then build. Fails before any graph work
    /// if a record is malformed.
    pub fn build_raw(&self, raw: Vec<RawTransition>, title: impl Into<String>) -> Result<FsmModel> {
        let transitions = validate_all(raw)?;
        self.build(&transitions, title)
    }

    /// Compute `(states, initial_state)` for a transition list.
    ///
    /// `keep_initial` is retained when it is still a member of the derived states.
    pub fn derive(
        &self,
        transitions: &[Transition],
        keep_initial: Option<&StateId>,
    ) -> Result<(Vec<StateId>, StateId)> {
        let mut states = derive_states(transitions);

        if transitions.is_empty() {
            let initial = StateId::new(DEFAULT_INITIAL_STATE)?;
            match self.empty_model {
                EmptyModelPolicy::Reject => return Err(Error::EmptyModel),
                EmptyModelPolicy::InsertInitial => states.push(initial.clone()),
                EmptyModelPolicy::AllowDetached => {}
            }
            return Ok((states, initial));
        }

        if let Some(current) = keep_initial
            && states.contains(current)
        {
            return Ok((states, current.clone()));
        }

        let initial = self.initial_state_for(transitions, &states);
        if let Some(previous) = keep_initial {
            tracing::warn!(
                "Initial state '{}' no longer exists, re-derived '{}'",
                previous,
                initial
            );
        }
        Ok((states, initial))
    }

    /// Preferred names win in priority order, then the source of the first transition.
    fn initial_state_for(&self, transitions: &[Transition], states: &[StateId]) -> StateId {
        for preferred in &self.preferences {
            if let Some(state) = states.iter().find(|s| s.normalized() == *preferred) {
                return state.clone();
            }
        }
        // Callers guarantee a non-empty list.
        transitions[0].state.clone()
    }
}

/// Union of every `state` and `next_state`, in order of first appearance
pub fn derive_states(transitions: &[Transition]) -> Vec<StateId> {
    let mut seen = HashSet::new();
    let mut states = Vec::new();
    for t in transitions {
        for state in [&t.state, &t.next_state] {
            if seen.insert(state) {
                states.push(state.clone());
            }
        }
    }
    states
}

/// Append every incoming transition whose key is not already present.
///
/// First occurrence wins, so duplicates within `incoming` are dropped as well.
pub fn merge(existing: &[Transition], incoming: &[Transition]) -> Vec<Transition> {
    let mut keys: HashSet<TransitionKey> = existing.iter().map(Transition::key).collect();
    let mut merged = existing.to_vec();
    for t in incoming {
        if keys.insert(t.key()) {
            merged.push(t.clone());
        }
    }
    merged
}

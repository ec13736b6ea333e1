//! State machine model
//!
//! `states` and `metadata` are derived from `transitions` and are never set
//! independently. Transitions are immutable once part of a model; edits are
//! whole-list operations followed by re-derivation.

use crate::error::{Error, Result};
use crate::state_machine::builder::{GraphBuilder, merge};
use crate::state_machine::{StateId, Transition, TransitionKey, TransitionSource};
use serde::{Deserialize, Serialize};

/// Derived counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub node_count: usize,
    pub edge_count: usize,
}

/// A finite state machine built from a transition list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelRecord")]
pub struct FsmModel {
    id: String,
    title: String,
    states: Vec<StateId>,
    initial_state: StateId,
    transitions: Vec<Transition>,
    metadata: ModelMetadata,
}

/// Wire shape of a model. Derived fields are optional and recomputed on load.
#[derive(Debug, Deserialize)]
struct ModelRecord {
    id: String,
    title: String,
    #[serde(default)]
    states: Vec<StateId>,
    initial_state: StateId,
    #[serde(default)]
    transitions: Vec<Transition>,
    #[serde(default)]
    metadata: Option<ModelMetadata>,
}

impl TryFrom<ModelRecord> for FsmModel {
    type Error = Error;

    fn try_from(record: ModelRecord) -> Result<Self> {
        if record.id.trim().is_empty() {
            return Err(Error::parser("model id must not be empty"));
        }

        let (states, initial_state) = if record.transitions.is_empty() {
            // An empty model keeps its initial literal, inserted into `states`
            // only if it was stored that way.
            let states = if record.states.contains(&record.initial_state) {
                vec![record.initial_state.clone()]
            } else {
                Vec::new()
            };
            (states, record.initial_state)
        } else {
            GraphBuilder::default().derive(&record.transitions, Some(&record.initial_state))?
        };
        if states != record.states {
            tracing::warn!(
                "Model {} stored {} states, re-derived {}",
                record.id,
                record.states.len(),
                states.len()
            );
        }

        let model = FsmModel::from_parts(
            record.id,
            record.title,
            states,
            initial_state,
            record.transitions,
        );
        if let Some(stored) = record.metadata
            && stored != model.metadata
        {
            tracing::debug!("Model {} had stale metadata {:?}", model.id, stored);
        }
        Ok(model)
    }
}

impl FsmModel {
    pub(crate) fn from_parts(
        id: String,
        title: String,
        states: Vec<StateId>,
        initial_state: StateId,
        transitions: Vec<Transition>,
    ) -> Self {
        let metadata = ModelMetadata {
            node_count: states.len(),
            edge_count: transitions.len(),
        };
        Self {
            id,
            title,
            states,
            initial_state,
            transitions,
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn initial_state(&self) -> &StateId {
        &self.initial_state
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn has_state(&self, state: &StateId) -> bool {
        self.states.contains(state)
    }

    /// Merge machine-suggested transitions into the model.
    ///
    /// Every incoming transition is tagged `LlmInferred`; those whose key is already
    /// present are dropped. Returns how many were added.
    pub fn accept_suggestions(
        &mut self,
        builder: &GraphBuilder,
        incoming: &[Transition],
    ) -> Result<usize> {
        let tagged: Vec<Transition> = incoming
            .iter()
            .cloned()
            .map(|t| t.with_source(TransitionSource::LlmInferred))
            .collect();
        let before = self.transitions.len();
        let merged = merge(&self.transitions, &tagged);
        let accepted = merged.len() - before;
        self.replace_transitions(builder, merged)?;
        Ok(accepted)
    }

    /// Remove every transition with the given key. Returns how many were removed.
    pub fn reject(&mut self, builder: &GraphBuilder, key: &TransitionKey) -> Result<usize> {
        let kept: Vec<Transition> = self
            .transitions
            .iter()
            .filter(|t| t.key() != *key)
            .cloned()
            .collect();
        let removed = self.transitions.len() - kept.len();
        if removed > 0 {
            self.replace_transitions(builder, kept)?;
        }
        Ok(removed)
    }

    /// Replace the transition list, re-deriving states, metadata and, if needed,
    /// the initial state. On error the model is left unchanged.
    pub fn replace_transitions(
        &mut self,
        builder: &GraphBuilder,
        transitions: Vec<Transition>,
    ) -> Result<()> {
        let (states, initial_state) = builder.derive(&transitions, Some(&self.initial_state))?;
        *self = Self::from_parts(
            std::mem::take(&mut self.id),
            std::mem::take(&mut self.title),
            states,
            initial_state,
            transitions,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuilderConfig, EmptyModelPolicy};
    use crate::state_machine::EventId;

    fn t(state: &str, event: &str, next: &str) -> Transition {
        Transition::new(
            StateId::new(state).unwrap(),
            EventId::new(event).unwrap(),
            "act",
            StateId::new(next).unwrap(),
        )
    }

    fn sample() -> (GraphBuilder, FsmModel) {
        let builder = GraphBuilder::default();
        let model = builder
            .build(&[t("idle", "start", "running"), t("running", "stop", "idle")], "m")
            .unwrap();
        (builder, model)
    }

    #[test]
    fn test_accept_suggestions_tags_and_rederives() {
        let (builder, mut model) = sample();
        let id = model.id().to_string();
        let accepted = model
            .accept_suggestions(
                &builder,
                &[t("running", "error", "failed"), t("idle", "start", "other")],
            )
            .unwrap();

        assert_eq!(accepted, 1);
        assert_eq!(model.id(), id);
        assert_eq!(model.transitions().len(), 3);
        assert_eq!(model.transitions()[2].source, TransitionSource::LlmInferred);
        assert!(model.has_state(&StateId::new("failed").unwrap()));
        assert_eq!(model.metadata().node_count, 3);
        assert_eq!(model.metadata().edge_count, 3);
    }

    #[test]
    fn test_reject_removes_key_and_orphan_states() {
        let (builder, mut model) = sample();
        model
            .accept_suggestions(&builder, &[t("running", "error", "failed")])
            .unwrap();
        let removed = model
            .reject(&builder, &t("running", "error", "x").key())
            .unwrap();

        assert_eq!(removed, 1);
        assert!(!model.has_state(&StateId::new("failed").unwrap()));
        assert_eq!(model.metadata().node_count, 2);
    }

    #[test]
    fn test_reject_unknown_key_is_noop() {
        let (builder, mut model) = sample();
        let before = model.clone();
        assert_eq!(model.reject(&builder, &t("nope", "x", "y").key()).unwrap(), 0);
        assert_eq!(model, before);
    }

    #[test]
    fn test_replace_rederives_missing_initial() {
        let (builder, mut model) = sample();
        model
            .replace_transitions(&builder, vec![t("open", "close", "closed")])
            .unwrap();
        assert_eq!(model.initial_state(), "open");
        assert_eq!(model.states(), &["open", "closed"]);
    }

    #[test]
    fn test_replace_with_empty_list_rejected_leaves_model() {
        let builder = GraphBuilder::new(&BuilderConfig {
            empty_model: EmptyModelPolicy::Reject,
            ..BuilderConfig::default()
        });
        let (_, mut model) = sample();
        let before = model.clone();
        assert!(model.replace_transitions(&builder, Vec::new()).is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn test_deserialize_recomputes_derived_fields() {
        let json = r#"{
            "id": "abc",
            "title": "stored",
            "states": ["idle", "ghost"],
            "initial_state": "idle",
            "transitions": [
                {"state": "idle", "event": "start", "action": "go", "next_state": "running"}
            ],
            "metadata": {"node_count": 7, "edge_count": 7}
        }"#;
        let model: FsmModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.states(), &["idle", "running"]);
        assert_eq!(model.metadata().node_count, 2);
        assert_eq!(model.metadata().edge_count, 1);
        assert_eq!(model.transitions()[0].source, TransitionSource::User);
    }

    #[test]
    fn test_deserialize_keeps_inserted_initial_literal() {
        let json = r#"{"id": "e", "title": "empty", "states": ["initial"], "initial_state": "initial"}"#;
        let model: FsmModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.states(), &["initial"]);
    }

    #[test]
    fn test_deserialize_drops_stored_initial_outside_transitions() {
        let json = r#"{
            "id": "g",
            "title": "ghost",
            "states": ["idle", "ghost"],
            "initial_state": "ghost",
            "transitions": [
                {"state": "idle", "event": "start", "action": "go", "next_state": "running"}
            ]
        }"#;
        let model: FsmModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.states(), &["idle", "running"]);
        assert_eq!(model.initial_state(), "idle");
    }

    #[test]
    fn test_deserialize_rederives_unknown_initial() {
        let json = r#"{
            "id": "n",
            "title": "nowhere",
            "initial_state": "nowhere",
            "transitions": [
                {"state": "boot", "event": "start", "action": "go", "next_state": "running"}
            ]
        }"#;
        let model: FsmModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.initial_state(), "boot");
        assert!(model.has_state(model.initial_state()));
    }

    #[test]
    fn test_deserialize_keeps_detached_initial_for_empty_model() {
        let json = r#"{"id": "d", "title": "empty", "initial_state": "initial"}"#;
        let model: FsmModel = serde_json::from_str(json).unwrap();
        assert!(model.states().is_empty());
        assert_eq!(model.initial_state(), "initial");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let (_, model) = sample();
        let json = serde_json::to_string(&model).unwrap();
        let back: FsmModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}

//! Transition representation

use crate::error::{Error, Result};
use crate::state_machine::{EventId, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a transition. Provenance never changes transition semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    #[default]
    User,
    LlmInferred,
}

impl TransitionSource {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionSource::User => "user",
            TransitionSource::LlmInferred => "llm_inferred",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TransitionSource::User => "darkgreen",
            TransitionSource::LlmInferred => "orange",
        }
    }
}

/// A transition between states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: StateId,
    pub event: EventId,
    /// Opaque guard label. Guards are metadata unless a `GuardEvaluator` is supplied.
    #[serde(default)]
    pub guard: Option<String>,
    /// May be empty for a no-op, but must be present.
    pub action: String,
    pub next_state: StateId,
    #[serde(default)]
    pub source: TransitionSource,
}

/// Identity of a transition for deduplication and determinism checks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionKey {
    pub state: StateId,
    pub event: EventId,
    pub guard: Option<String>,
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state='{}', event='{}', guard='{}'",
            self.state,
            self.event,
            self.guard.as_deref().unwrap_or("None")
        )
    }
}

impl Transition {
    pub fn new(
        state: StateId,
        event: EventId,
        action: impl Into<String>,
        next_state: StateId,
    ) -> Self {
        Self {
            state,
            event,
            guard: None,
            action: action.into(),
            next_state,
            source: TransitionSource::User,
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_source(mut self, source: TransitionSource) -> Self {
        self.source = source;
        self
    }

    /// The `(state, event, guard)` identity; action, target and source are not part of it
    pub fn key(&self) -> TransitionKey {
        TransitionKey {
            state: self.state.clone(),
            event: self.event.clone(),
            guard: self.guard.clone(),
        }
    }

    /// Get display label for the transition
    pub fn display_label(&self) -> String {
        let mut label = self.event.to_string();
        if let Some(guard) = &self.guard {
            label.push_str(&format!(" [{}]", guard));
        }
        if !self.action.is_empty() {
            label.push_str(&format!(" / {}", self.action));
        }
        label
    }
}

/// An untrusted transition record, as produced by the extraction collaborator.
///
/// Every field is optional so that missing fields can be reported with the
/// position of the offending record instead of a generic decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransition {
    pub state: Option<String>,
    pub event: Option<String>,
    pub guard: Option<String>,
    pub action: Option<String>,
    pub next_state: Option<String>,
    pub source: Option<TransitionSource>,
}

impl RawTransition {
    /// Validate into a `Transition`. `index` is only used for error reporting.
    ///
    /// A whitespace-only guard is read as "unconditional".
    pub fn validate(self, index: usize) -> Result<Transition> {
        let state = required_identifier(index, "state", self.state, |v| StateId::new(v))?;
        let event = required_identifier(index, "event", self.event, |v| EventId::new(v))?;
        let next_state = required_identifier(index, "next_state", self.next_state, |v| StateId::new(v))?;
        let action = self
            .action
            .ok_or_else(|| Error::invalid_transition(index, "missing field 'action'"))?;
        let guard = self
            .guard
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Ok(Transition {
            state,
            event,
            guard,
            action: action.trim().to_string(),
            next_state,
            source: self.source.unwrap_or_default(),
        })
    }
}

fn required_identifier<T>(
    index: usize,
    field: &str,
    value: Option<String>,
    make: impl FnOnce(String) -> Result<T>,
) -> Result<T> {
    let value = value
        .ok_or_else(|| Error::invalid_transition(index, format!("missing field '{}'", field)))?;
    make(value).map_err(|_| Error::invalid_transition(index, format!("field '{}' is empty", field)))
}

/// Validate a whole list of raw transitions, failing on the first malformed one
pub fn validate_all(raw: Vec<RawTransition>) -> Result<Vec<Transition>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, t)| t.validate(index))
        .collect()
}

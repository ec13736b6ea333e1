//! Input documents
//!
//! Transition files come from the extraction step and are untrusted. They may
//! be a bare JSON array of transitions, or a JSON/TOML document with an
//! optional `title` and a `transitions` list.

use crate::state_machine::{FsmModel, RawTransition, Transition, transition::validate_all};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// A parsed transitions file
#[derive(Debug, Default)]
pub struct TransitionDocument {
    pub title: Option<String>,
    pub transitions: Vec<RawTransition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    List(Vec<RawTransition>),
    Titled {
        title: Option<String>,
        transitions: Vec<RawTransition>,
    },
}

#[derive(Deserialize)]
struct TomlDocument {
    title: Option<String>,
    #[serde(default)]
    transitions: Vec<RawTransition>,
}

/// Read a transitions file, choosing the format from the extension
pub fn read_transition_document(path: &Path) -> Result<TransitionDocument> {
    let content = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        parse_toml(&content).map_err(|message| Error::FileParse {
            file: path.to_path_buf(),
            message,
        })
    } else {
        parse_json(&content).map_err(|message| Error::FileParse {
            file: path.to_path_buf(),
            message,
        })
    }
}

fn parse_json(content: &str) -> std::result::Result<TransitionDocument, String> {
    let document: JsonDocument = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(match document {
        JsonDocument::List(transitions) => TransitionDocument {
            title: None,
            transitions,
        },
        JsonDocument::Titled { title, transitions } => TransitionDocument { title, transitions },
    })
}

fn parse_toml(content: &str) -> std::result::Result<TransitionDocument, String> {
    let document: TomlDocument = toml::from_str(content).map_err(|e| e.to_string())?;
    Ok(TransitionDocument {
        title: document.title,
        transitions: document.transitions,
    })
}

/// Read and validate a transitions file
pub fn read_transitions(path: &Path) -> Result<Vec<Transition>> {
    validate_all(read_transition_document(path)?.transitions)
}

/// Read a model JSON document
pub fn read_model(path: &Path) -> Result<FsmModel> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::FileParse {
        file: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Title from the document, falling back to the file stem
pub fn default_title(path: &Path, document: &TransitionDocument) -> String {
    document
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Untitled".to_string())
}

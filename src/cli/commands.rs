//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::cli::{ModelTarget, OutputFormat, input};
use crate::state_machine::FsmModel;
use crate::store::create_store;
use crate::{Config, Result, bail};
use serde::Serialize;
use std::path::PathBuf;

/// Load a model either from a file or from the configured store
async fn load_model(config: &Config, target: &ModelTarget) -> Result<FsmModel> {
    match (&target.model, &target.id) {
        (Some(path), _) => {
            tracing::debug!("Reading model from {:?}", path);
            input::read_model(path)
        }
        (None, Some(id)) => {
            tracing::debug!("Loading model {} from store", id);
            create_store(config).require(id).await
        }
        (None, None) => bail!("Either --model or --id is required"),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    crate::cli::output::output_json(&mut std::io::stdout(), value)
}

/// Build command implementation
pub mod build {
    use super::*;
    use crate::state_machine::GraphBuilder;

    /// Execute the build command
    pub async fn execute(
        config: &Config,
        input_path: PathBuf,
        title: Option<String>,
        store: bool,
        output: OutputFormat,
    ) -> Result<()> {
        tracing::info!("Reading transitions from {:?}", input_path);
        let document = input::read_transition_document(&input_path)?;
        let title = title.unwrap_or_else(|| input::default_title(&input_path, &document));

        tracing::info!(
            "Building '{}' from {} transitions",
            title,
            document.transitions.len()
        );
        let model = GraphBuilder::new(&config.builder).build_raw(document.transitions, title)?;

        if store {
            create_store(config).put(&model).await?;
        }

        match output {
            OutputFormat::Json => print_json(&model)?,
            OutputFormat::Table => {
                crate::cli::output::output_model_table(&mut std::io::stdout(), &model)?
            }
        }
        Ok(())
    }
}

/// Verify command implementation
pub mod verify {
    use super::*;
    use crate::state_machine::verify_model;

    /// Execute the verify command
    pub async fn execute(config: &Config, target: ModelTarget, output: OutputFormat) -> Result<()> {
        let model = load_model(config, &target).await?;
        tracing::info!("Verifying model {}", model.id());

        let report = verify_model(config, &model);
        if !report.errors.is_empty() {
            tracing::warn!("Model {} has {} errors", model.id(), report.errors.len());
        }

        match output {
            OutputFormat::Json => print_json(&report)?,
            OutputFormat::Table => crate::cli::output::output_report_table(
                &mut std::io::stdout(),
                &model,
                &report,
            )?,
        }
        Ok(())
    }
}

/// Simulate command implementation
pub mod simulate {
    use super::*;
    use crate::state_machine::{NamedGuards, StateId, parse_events, simulate, simulate_with};

    /// Execute the simulate command
    pub async fn execute(
        config: &Config,
        target: ModelTarget,
        events: Vec<String>,
        from: Option<String>,
        guards: Vec<String>,
        output: OutputFormat,
    ) -> Result<()> {
        let model = load_model(config, &target).await?;
        let events = parse_events(&events)?;
        let start = from.map(|s| StateId::new(s)).transpose()?;

        tracing::info!(
            "Simulating {} events against model {}",
            events.len(),
            model.id()
        );
        let steps = if guards.is_empty() {
            simulate(&model, &events, start.as_ref())
        } else {
            simulate_with(&model, &events, start.as_ref(), &NamedGuards::new(guards))?
        };

        match output {
            OutputFormat::Json => print_json(&steps)?,
            OutputFormat::Table => {
                crate::cli::output::output_steps_table(&mut std::io::stdout(), &model, &steps)?
            }
        }
        Ok(())
    }
}

/// Merge command implementation
pub mod merge {
    use super::*;
    use crate::state_machine::merge;

    /// Execute the merge command
    pub fn execute(existing: PathBuf, incoming: PathBuf) -> Result<()> {
        let existing = input::read_transitions(&existing)?;
        let incoming = input::read_transitions(&incoming)?;

        let merged = merge(&existing, &incoming);
        tracing::info!(
            "Merged {} incoming transitions, kept {}",
            incoming.len(),
            merged.len() - existing.len()
        );
        print_json(&merged)
    }
}

/// Accept/reject/update command implementations
pub mod edit {
    use super::*;
    use crate::state_machine::{EventId, GraphBuilder, StateId, TransitionKey};

    /// Accept suggested transitions into a stored model
    pub async fn accept(config: &Config, id: String, input_path: PathBuf) -> Result<()> {
        let store = create_store(config);
        let mut model = store.require(&id).await?;
        let suggestions = input::read_transitions(&input_path)?;

        let builder = GraphBuilder::new(&config.builder);
        let accepted = model.accept_suggestions(&builder, &suggestions)?;
        tracing::info!(
            "Accepted {} of {} suggested transitions into {}",
            accepted,
            suggestions.len(),
            id
        );

        store.put(&model).await?;
        print_json(&model)
    }

    /// Remove a transition from a stored model
    pub async fn reject(
        config: &Config,
        id: String,
        state: String,
        event: String,
        guard: Option<String>,
    ) -> Result<()> {
        let store = create_store(config);
        let mut model = store.require(&id).await?;
        let key = TransitionKey {
            state: StateId::new(state)?,
            event: EventId::new(event)?,
            guard: guard.map(|g| g.trim().to_string()).filter(|g| !g.is_empty()),
        };

        let builder = GraphBuilder::new(&config.builder);
        let removed = model.reject(&builder, &key)?;
        if removed == 0 {
            tracing::warn!("No transition matching {} in model {}", key, id);
        } else {
            tracing::info!("Removed {} transitions from {}", removed, id);
            store.put(&model).await?;
        }
        print_json(&model)
    }

    /// Replace every transition of a stored model
    pub async fn update(config: &Config, id: String, input_path: PathBuf) -> Result<()> {
        let store = create_store(config);
        let mut model = store.require(&id).await?;
        let transitions = input::read_transitions(&input_path)?;

        let builder = GraphBuilder::new(&config.builder);
        model.replace_transitions(&builder, transitions)?;
        tracing::info!(
            "Replaced transitions of {}, now {} states and {} transitions",
            id,
            model.metadata().node_count,
            model.metadata().edge_count
        );

        store.put(&model).await?;
        print_json(&model)
    }
}

/// Export command implementation
pub mod export {
    use super::*;
    use crate::cli::ExportFormat;
    use crate::state_machine::TransitionGraph;

    /// Execute the export command
    pub async fn execute(config: &Config, target: ModelTarget, format: ExportFormat) -> Result<()> {
        let model = load_model(config, &target).await?;
        match format {
            ExportFormat::Dot => {
                tracing::info!("Building state graph for DOT output...");
                print!("{}", TransitionGraph::from_model(&model).to_dot());
            }
            ExportFormat::Json => print_json(&model)?,
        }
        Ok(())
    }
}

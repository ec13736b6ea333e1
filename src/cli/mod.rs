//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod input;
pub mod output;

/// Scenario state machine toolkit CLI
#[derive(Parser, Debug)]
#[command(name = "autostate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, global = true, env = "AUTOSTATE_LOG")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a state machine from a transitions file (JSON or TOML)
    Build {
        /// Transitions file
        #[arg(short, long)]
        input: PathBuf,

        /// Model title (defaults to the document title or file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Persist the model in the configured store
        #[arg(long)]
        store: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        output: OutputFormat,
    },

    /// Verify determinism, reachability, completeness and security heuristics
    Verify {
        #[command(flatten)]
        target: ModelTarget,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Replay an event sequence against a model
    Simulate {
        #[command(flatten)]
        target: ModelTarget,

        /// Comma-separated events to replay
        #[arg(short, long, value_delimiter = ',', required = true)]
        events: Vec<String>,

        /// Start state (defaults to the model's initial state)
        #[arg(long)]
        from: Option<String>,

        /// Evaluate guards, treating these guard names as true (repeatable)
        #[arg(long = "guard")]
        guards: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Merge two transition files, dropping duplicate (state, event, guard) keys
    Merge {
        /// Base transitions file
        #[arg(long)]
        existing: PathBuf,

        /// Transitions to add
        #[arg(long)]
        incoming: PathBuf,
    },

    /// Accept suggested transitions into a stored model
    Accept {
        /// Stored model id
        #[arg(long)]
        id: String,

        /// Suggested transitions file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Remove a transition from a stored model by its key
    Reject {
        /// Stored model id
        #[arg(long)]
        id: String,

        #[arg(long)]
        state: String,

        #[arg(long)]
        event: String,

        #[arg(long)]
        guard: Option<String>,
    },

    /// Replace the transitions of a stored model
    Update {
        /// Stored model id
        #[arg(long)]
        id: String,

        /// Replacement transitions file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Export a model as a Graphviz graph or JSON document
    Export {
        #[command(flatten)]
        target: ModelTarget,

        /// Export format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: ExportFormat,
    },
}

/// Where to read a model from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ModelTarget {
    /// Model JSON file
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Stored model id
    #[arg(long)]
    pub id: Option<String>,
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// DOT format (Graphviz)
    Dot,
    /// Model JSON document
    Json,
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Build {
            input,
            title,
            store,
            output,
        } => commands::build::execute(&config, input, title, store, output).await,
        Commands::Verify { target, output } => {
            commands::verify::execute(&config, target, output).await
        }
        Commands::Simulate {
            target,
            events,
            from,
            guards,
            output,
        } => commands::simulate::execute(&config, target, events, from, guards, output).await,
        Commands::Merge { existing, incoming } => commands::merge::execute(existing, incoming),
        Commands::Accept { id, input } => commands::edit::accept(&config, id, input).await,
        Commands::Reject {
            id,
            state,
            event,
            guard,
        } => commands::edit::reject(&config, id, state, event, guard).await,
        Commands::Update { id, input } => commands::edit::update(&config, id, input).await,
        Commands::Export { target, format } => {
            commands::export::execute(&config, target, format).await
        }
    }
}

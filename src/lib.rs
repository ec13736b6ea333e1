//! Scenario State Machine Toolkit
//!
//! Turns transition lists extracted from natural-language scenarios into
//! finite state machine models, and checks and replays them.
//!
//! This library provides functionality for:
//! - Building consistent state machine models from untrusted transition lists
//! - Verifying determinism, reachability, completeness and security heuristics
//! - Replaying event sequences step by step
//! - Merging machine-suggested transitions into user models
//! - Storing models by id

pub mod cli;
pub mod config;
pub mod error;
pub mod state_machine;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "autostate");
    }
}

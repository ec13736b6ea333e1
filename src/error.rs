//! This module defines all error types used throughout the application.
//!
//! Only malformed input halts processing. Non-determinism, unreachable states
//! and similar findings are reported as data by the verifier, never as errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A state or event identifier was empty or whitespace-only
    #[error("Invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// A raw transition failed validation before graph construction
    #[error("Invalid transition at index {index}: {message}")]
    InvalidTransition { index: usize, message: String },

    /// The transition list was empty and the empty-model policy rejects it
    #[error("Cannot build a state machine from an empty transition list")]
    EmptyModel,

    /// A guard evaluator could not evaluate an expression
    #[error("Guard {guard:?} could not be evaluated: {message}")]
    Guard { guard: String, message: String },

    /// No stored model with the given id
    #[error("State machine not found: {0}")]
    ModelNotFound(String),

    /// Persistence errors
    #[error("Store error: {0}")]
    Store(String),

    /// Input document parsing errors
    #[error("Parser error: {0}")]
    Parser(String),

    /// Document parsing errors tied to a file
    #[error("Parsing error in {file:?}: {message}")]
    FileParse { file: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Self::Parser(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a transition validation error
    pub fn invalid_transition(index: usize, msg: impl Into<String>) -> Self {
        Self::InvalidTransition {
            index,
            message: msg.into(),
        }
    }
}

// Implement From traits for common external error types

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parser(format!("JSON error: {}", err))
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::custom("test error");
        assert_eq!(err.to_string(), "test error");

        let err = Error::invalid_transition(3, "missing event");
        assert_eq!(err.to_string(), "Invalid transition at index 3: missing event");
    }

    #[test]
    fn test_custom_error_macro() {
        let err = custom_error!("bad {}", 42);
        assert_eq!(err.to_string(), "bad 42");
    }
}

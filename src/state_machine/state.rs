//! State and event identifiers
//!
//! Identifiers are trimmed on construction and must not be empty. Matching is
//! case-sensitive; only initial-state selection compares lowercased names.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(Error::InvalidIdentifier {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Name of a state in the machine
    StateId,
    "state"
);

identifier!(
    /// Name of an event that triggers transitions
    EventId,
    "event"
);

impl StateId {
    /// Lowercased name, used when matching against initial-state preferences
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_is_trimmed() {
        let id = StateId::new("  idle ").unwrap();
        assert_eq!(id.as_str(), "idle");
        assert_eq!(id, "idle");
    }

    #[test]
    fn test_empty_identifier_rejected() {
        assert!(StateId::new("").is_err());
        let err = EventId::new("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { kind: "event", .. }));
    }

    #[test]
    fn test_case_is_preserved() {
        let id = StateId::new("Idle").unwrap();
        assert_eq!(id.as_str(), "Idle");
        assert_eq!(id.normalized(), "idle");
    }

    #[test]
    fn test_serde_rejects_empty() {
        let ok: StateId = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(ok, "running");
        assert!(serde_json::from_str::<StateId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"running\"");
    }
}

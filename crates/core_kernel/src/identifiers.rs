//! Strongly-typed identifiers for domain entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types. Identifiers display as the
//! bare 36 character UUID because that is the persisted form; the prefix is
//! only used for log-friendly rendering and is accepted when parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// The nil identifier, used for entities that were never assigned one
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns true for the nil identifier
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }

            /// Renders the identifier with its prefix, e.g. for log lines
            pub fn prefixed(&self) -> String {
                format!("{}-{}", $prefix, self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let uuid_str = trimmed
                    .strip_prefix(concat!($prefix, "-"))
                    .unwrap_or(trimmed);
                Uuid::parse_str(uuid_str)
                    .map(Self)
                    .map_err(|e| CoreError::InvalidIdentifier(format!("{}: {}", s, e)))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(ForecastId, "FCST");
define_id!(ActivityId, "ACT");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_uuid() {
        let id = ForecastId::new();
        let display = id.to_string();
        assert_eq!(display.len(), 36);
        assert!(id.prefixed().starts_with("FCST-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = ForecastId::new();
        let parsed: ForecastId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);

        let prefixed: ForecastId = original.prefixed().parse().unwrap();
        assert_eq!(original, prefixed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let activity_id = ActivityId::from(uuid);
        let back: Uuid = activity_id.into();
        assert_eq!(uuid, back);
    }
}

//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! weather forecast test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data (seed rows, fixed instants)
//! - `builders`: Builder patterns for forecasts and activity entries
//! - `database`: PostgreSQL test container management
//! - `assertions`: Assertion helpers for entities and pages
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

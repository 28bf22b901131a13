//! Infrastructure Database Layer
//!
//! This crate provides persistence for the weather forecast service: storage
//! engines, per-session change tracking, and a generic repository with a
//! hookable save pipeline and optimistic concurrency.
//!
//! # Architecture
//!
//! ```text
//! Repository<E>  (SqlRepository<E, S, H>)
//!    ├── ChangeTracker<E>    pending changes + original snapshots
//!    ├── SaveHooks<E>        validate / before / after
//!    └── EntityStore<E>      InMemoryStore | PgForecastStore | PgActivityStore
//! ```
//!
//! Every write carries the token the caller last saw. A store refuses a
//! change whose token no longer matches, and the repository turns that into
//! a `ConcurrencyConflict` carrying the row's current values.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, migrate, DatabaseConfig, ForecastHooks, PgForecastStore, Repository, SqlRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/weather")).await?;
//! migrate(&pool).await?;
//! let repo = SqlRepository::new(PgForecastStore::new(pool), ForecastHooks);
//! let forecasts = repo.filter_no_tracking().await?;
//! ```

pub mod pool;
pub mod error;
pub mod store;
pub mod tracker;
pub mod hooks;
pub mod repository;
pub mod repositories;
pub mod health;

pub use pool::{create_pool, migrate, DatabaseConfig, DatabasePool};
pub use error::{ConcurrencyViolation, ConflictEntry, DatabaseError, RepositoryError, StoreError};
pub use store::{
    Change, EntityStore, InMemoryStore, PgActivityStore, PgForecastStore, QuerySpec, SharedStore,
};
pub use tracker::{ChangeTracker, TrackedEntry};
pub use hooks::{LoggingHooks, SaveHooks};
pub use repository::{Predicate, Repository, SqlRepository};
pub use repositories::{ActivityHooks, ActivityRepository, ForecastHooks, ForecastRepository};
pub use health::DatabaseHealth;

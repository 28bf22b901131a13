//! Core Kernel - Foundational types for the weather forecast service
//!
//! This crate provides the building blocks shared by every other crate:
//! - Strongly-typed identifiers
//! - The `Entity` contract with audit fields and a concurrency token
//! - Pagination and sorting value objects
//! - A `Clock` abstraction for timestamp stamping
//! - Port and health check traits for adapters

pub mod identifiers;
pub mod entity;
pub mod pagination;
pub mod temporal;
pub mod ports;
pub mod error;

pub use identifiers::{ForecastId, ActivityId};
pub use entity::{AuditFields, Entity, EntityState, SortColumn};
pub use pagination::{PagedResult, PaginationQuery, SortDirection};
pub use temporal::{Clock, FixedClock, SystemClock};
pub use ports::{AdapterHealth, HealthCheckResult, HealthCheckable};
pub use error::CoreError;

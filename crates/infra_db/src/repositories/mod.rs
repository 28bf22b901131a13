//! Repositories for the concrete entity types
//!
//! Each module pairs an entity with the hooks its save pipeline runs and
//! exposes a type alias over [`SqlRepository`](crate::repository::SqlRepository).

pub mod activity;
pub mod forecast;

pub use activity::{ActivityHooks, ActivityRepository};
pub use forecast::{ForecastHooks, ForecastRepository};

//! Weather Forecast Domain
//!
//! This crate defines the entities persisted by the service and the rules
//! that apply to them before they reach storage.
//!
//! - **WeatherForecast**: a forecast for one date, with the Fahrenheit value
//!   always derived from Celsius
//! - **UserActivityLog**: one entry per API request, written by the activity
//!   logging middleware
//!
//! Both implement [`core_kernel::Entity`] so they can be managed by the
//! generic repository in `infra_db`.
//!
//! # Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use domain_forecast::{WeatherForecast, ForecastValidator};
//!
//! let forecast = WeatherForecast::new(
//!     NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
//!     25,
//!     "Hot",
//! );
//!
//! assert_eq!(forecast.temperature_f, 76);
//! assert!(ForecastValidator::validate(&forecast).is_valid);
//! ```

pub mod forecast;
pub mod activity;
pub mod validation;
pub mod seed;
pub mod error;

pub use forecast::{celsius_to_fahrenheit, ForecastSortColumn, WeatherForecast, SUMMARIES};
pub use activity::{ActivitySortColumn, UserActivityLog};
pub use validation::{ForecastValidator, ValidationResult};
pub use seed::seed_forecasts;
pub use error::ForecastError;

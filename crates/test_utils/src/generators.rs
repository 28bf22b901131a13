//! Property-Based Test Generators
//!
//! Provides proptest strategies that produce valid domain values.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use core_kernel::{PaginationQuery, SortDirection};
use domain_forecast::{WeatherForecast, SUMMARIES};

/// Celsius values the validator accepts
pub fn temperature_strategy() -> impl Strategy<Value = i32> {
    -273i32..=1000i32
}

/// One of the standard summaries
pub fn summary_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(SUMMARIES.to_vec()).prop_map(str::to_string)
}

/// Dates within 2025
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..365).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default() + Days::new(offset)
    })
}

/// Valid unsaved forecasts with fresh identifiers
pub fn forecast_strategy() -> impl Strategy<Value = WeatherForecast> {
    (date_strategy(), temperature_strategy(), summary_strategy())
        .prop_map(|(date, temperature, summary)| WeatherForecast::new(date, temperature, summary))
}

pub fn sort_direction_strategy() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

/// Page requests over the sortable forecast columns
pub fn forecast_query_strategy() -> impl Strategy<Value = PaginationQuery> {
    (
        1u32..6,
        1u32..12,
        prop::sample::select(vec!["date", "temperatureC", "summary", "createdDate"]),
        sort_direction_strategy(),
    )
        .prop_map(|(page, size, column, direction)| {
            PaginationQuery::new(page, size).sorted_by(column, direction)
        })
}

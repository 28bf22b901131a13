//! Tests for domain_forecast

use chrono::NaiveDate;
use proptest::prelude::*;

use core_kernel::{Entity, SortColumn};
use domain_forecast::{
    celsius_to_fahrenheit, seed_forecasts, ActivitySortColumn, ForecastSortColumn,
    ForecastValidator, WeatherForecast,
};

// ============================================================================
// Forecast Tests
// ============================================================================

mod forecast_tests {
    use super::*;

    #[test]
    fn test_new_forecast_is_unstamped() {
        let forecast = WeatherForecast::new(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), 10, "Mild");

        assert!(forecast.has_identity());
        assert!(forecast.version().is_nil());
        assert_eq!(forecast.audit.created_by, "System");
        assert!(forecast.audit.modified_date.is_none());
    }

    #[test]
    fn test_json_roundtrip_keeps_audit_fields() {
        let forecast = seed_forecasts().remove(0);
        let json = serde_json::to_string(&forecast).unwrap();
        let parsed: WeatherForecast = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, forecast);
        assert!(json.contains("\"version\":\"38b7942a-8a8f-4a34-9744-e4dea6eaed78\""));
    }

    #[test]
    fn test_sort_by_temperature() {
        let mut rows = seed_forecasts();
        rows.sort_by(|a, b| ForecastSortColumn::TemperatureC.compare(a, b));
        let temperatures: Vec<i32> = rows.iter().map(|f| f.temperature_c).collect();
        assert_eq!(temperatures, vec![5, 15, 20, 25, 35]);
    }

    #[test]
    fn test_seed_summaries() {
        let summaries: Vec<String> = seed_forecasts().into_iter().map(|f| f.summary).collect();
        assert_eq!(summaries, vec!["Hot", "Cool", "Cold", "Hot", "Warm"]);
    }

    #[test]
    fn test_seed_rows_are_valid() {
        for forecast in seed_forecasts() {
            assert!(ForecastValidator::validate(&forecast).is_valid);
        }
    }
}

// ============================================================================
// Sort Column Tests
// ============================================================================

mod sort_column_tests {
    use super::*;

    #[test]
    fn test_column_names_are_snake_case() {
        assert_eq!(ForecastSortColumn::TemperatureF.column_name(), "temperature_f");
        assert_eq!(ActivitySortColumn::ResponseStatusCode.column_name(), "response_status_code");
    }

    #[test]
    fn test_summary_sorts_case_insensitively() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let upper = WeatherForecast::new(date, 10, "Mild");
        let lower = WeatherForecast::new(date, 10, "balmy");

        assert_eq!(
            ForecastSortColumn::Summary.compare(&lower, &upper),
            std::cmp::Ordering::Less
        );
        assert_eq!(ForecastSortColumn::Summary.column_name(), "LOWER(summary)");
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        assert!("version".parse::<ForecastSortColumn>().is_err());
        assert!("1; DROP TABLE user_activity_log".parse::<ActivitySortColumn>().is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_fahrenheit_is_monotonic(c in -273i32..1000) {
        prop_assert!(celsius_to_fahrenheit(c) <= celsius_to_fahrenheit(c + 1));
    }

    #[test]
    fn prop_set_temperature_derives_fahrenheit(c in -273i32..=1000) {
        let mut forecast = WeatherForecast::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 0, "Mild");
        forecast.set_temperature_c(c);
        prop_assert_eq!(forecast.temperature_f, celsius_to_fahrenheit(c));
        prop_assert!(ForecastValidator::validate(&forecast).is_valid);
    }
}

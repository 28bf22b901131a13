//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data. The forecast rows are the same five rows
//! every backend is seeded with.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;

use core_kernel::ForecastId;
use domain_forecast::{seed_forecasts, UserActivityLog, WeatherForecast};

static SEEDED: Lazy<Vec<WeatherForecast>> = Lazy::new(seed_forecasts);

/// Fixture for forecast test data
pub struct ForecastFixtures;

impl ForecastFixtures {
    /// The five seeded forecasts, ordered by date
    pub fn seeded() -> Vec<WeatherForecast> {
        SEEDED.clone()
    }

    /// The first seeded forecast: 2025-01-04, 25°C, "Hot"
    pub fn hot() -> WeatherForecast {
        SEEDED[0].clone()
    }

    /// The third seeded forecast: 2025-01-09, 5°C, "Cold"
    pub fn cold() -> WeatherForecast {
        SEEDED[2].clone()
    }

    /// Identifier of the first seeded forecast
    pub fn hot_id() -> ForecastId {
        SEEDED[0].id
    }

    /// `count` unsaved forecasts on consecutive days from 2025-03-01
    pub fn many(count: usize) -> Vec<WeatherForecast> {
        let start = TemporalFixtures::forecast_date();
        (0..count)
            .map(|i| {
                let temperature = (i % 40) as i32 - 5;
                WeatherForecast::new(
                    start + chrono::Days::new(i as u64),
                    temperature,
                    format!("Forecast {}", i),
                )
            })
            .collect()
    }
}

/// Fixture for activity log test data
pub struct ActivityFixtures;

impl ActivityFixtures {
    /// A GET of the forecast listing that returned 200
    pub fn forecast_listing() -> UserActivityLog {
        let mut entry = UserActivityLog::new(TemporalFixtures::now());
        entry.request_method = Some("GET".to_string());
        entry.request_path = Some("/api/v1/weatherforecast".to_string());
        entry.host = Some("localhost".to_string());
        entry.response_status_code = Some(200);
        entry
    }
}

/// Fixture for instants and dates
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed "now" used with `FixedClock`
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 2, 9, 30, 0)
            .single()
            .unwrap_or_default()
    }

    /// A forecast date that no seeded row uses
    pub fn forecast_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default()
    }
}

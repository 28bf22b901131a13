//! Test Data Builders
//!
//! Builders let a test name only the fields it cares about.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use core_kernel::ForecastId;
use domain_forecast::{celsius_to_fahrenheit, UserActivityLog, WeatherForecast};

use crate::fixtures::TemporalFixtures;

/// Builder for forecasts
pub struct ForecastBuilder {
    forecast: WeatherForecast,
}

impl Default for ForecastBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastBuilder {
    /// A valid, unsaved 20°C "Mild" forecast
    pub fn new() -> Self {
        Self {
            forecast: WeatherForecast::new(TemporalFixtures::forecast_date(), 20, "Mild"),
        }
    }

    pub fn with_id(mut self, id: ForecastId) -> Self {
        self.forecast.id = id;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.forecast.date = date;
        self
    }

    /// Sets Celsius and the matching Fahrenheit value
    pub fn with_temperature(mut self, celsius: i32) -> Self {
        self.forecast.set_temperature_c(celsius);
        self
    }

    /// Sets Fahrenheit without touching Celsius
    pub fn with_raw_fahrenheit(mut self, fahrenheit: i32) -> Self {
        self.forecast.temperature_f = fahrenheit;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.forecast.summary = summary.into();
        self
    }

    pub fn with_version(mut self, version: Uuid) -> Self {
        self.forecast.audit.version = version;
        self
    }

    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.forecast.audit.created_by = user.into();
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.forecast.audit.created_date = at;
        self
    }

    pub fn build(self) -> WeatherForecast {
        self.forecast
    }
}

/// Builder for activity log entries
pub struct ActivityLogBuilder {
    entry: UserActivityLog,
}

impl Default for ActivityLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLogBuilder {
    pub fn new() -> Self {
        Self {
            entry: UserActivityLog::new(TemporalFixtures::now()),
        }
    }

    pub fn request(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.entry.request_method = Some(method.into());
        self.entry.request_path = Some(path.into());
        self
    }

    pub fn status(mut self, code: i32) -> Self {
        self.entry.response_status_code = Some(code);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.entry.username = Some(username.into());
        self
    }

    pub fn request_headers(mut self, headers: impl Into<String>) -> Self {
        self.entry.request_headers = Some(headers.into());
        self
    }

    pub fn requested_at(mut self, at: DateTime<Utc>) -> Self {
        self.entry.request_time = at;
        self
    }

    pub fn build(self) -> UserActivityLog {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_builder_keeps_fahrenheit_in_step() {
        let forecast = ForecastBuilder::new().with_temperature(35).build();
        assert_eq!(forecast.temperature_f, celsius_to_fahrenheit(35));
    }

    #[test]
    fn test_raw_fahrenheit_is_not_recomputed() {
        let forecast = ForecastBuilder::new().with_raw_fahrenheit(0).build();
        assert_eq!(forecast.temperature_f, 0);
    }
}

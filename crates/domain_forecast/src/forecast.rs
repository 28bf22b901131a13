//! The weather forecast entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use core_kernel::{AuditFields, CoreError, Entity, ForecastId, SortColumn};

/// Descriptions offered to clients that generate random forecasts
pub const SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

/// Converts Celsius to Fahrenheit the way the forecast table stores it
///
/// The quotient is truncated toward zero before the offset is added, so
/// `25°C` is stored as `76°F`.
pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    32 + (f64::from(celsius) / 0.5556) as i32
}

/// A weather forecast for a specific date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    /// Unique identifier, persisted as a 36 character string
    pub id: ForecastId,
    /// The forecasted date
    pub date: NaiveDate,
    /// Temperature in Celsius
    pub temperature_c: i32,
    /// Temperature in Fahrenheit, derived from `temperature_c`
    pub temperature_f: i32,
    /// Description of the weather (e.g. sunny, rainy)
    pub summary: String,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl WeatherForecast {
    /// Creates an unsaved forecast with a fresh identifier
    pub fn new(date: NaiveDate, temperature_c: i32, summary: impl Into<String>) -> Self {
        Self {
            id: ForecastId::new(),
            date,
            temperature_c,
            temperature_f: celsius_to_fahrenheit(temperature_c),
            summary: summary.into(),
            audit: AuditFields::default(),
        }
    }

    /// Sets the identifier
    pub fn with_id(mut self, id: ForecastId) -> Self {
        self.id = id;
        self
    }

    /// Sets who created the record
    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.audit.created_by = user.into();
        self
    }

    /// Updates the Celsius value and keeps Fahrenheit in step
    pub fn set_temperature_c(&mut self, celsius: i32) {
        self.temperature_c = celsius;
        self.temperature_f = celsius_to_fahrenheit(celsius);
    }

    /// Re-derives `temperature_f` after `temperature_c` was assigned directly
    pub fn sync_fahrenheit(&mut self) {
        self.temperature_f = celsius_to_fahrenheit(self.temperature_c);
    }
}

impl Entity for WeatherForecast {
    type SortColumn = ForecastSortColumn;

    const ENTITY_TYPE: &'static str = "WeatherForecast";

    fn id(&self) -> String {
        self.id.to_string()
    }

    fn has_identity(&self) -> bool {
        !self.id.is_nil()
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.summary.to_lowercase().contains(&term) || self.id.to_string().contains(&term)
    }
}

/// Columns a forecast listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSortColumn {
    Id,
    Date,
    TemperatureC,
    TemperatureF,
    Summary,
    CreatedDate,
}

impl FromStr for ForecastSortColumn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "id" => Ok(Self::Id),
            "date" => Ok(Self::Date),
            "temperaturec" => Ok(Self::TemperatureC),
            "temperaturef" => Ok(Self::TemperatureF),
            "summary" => Ok(Self::Summary),
            "createddate" => Ok(Self::CreatedDate),
            _ => Err(CoreError::unknown_sort_column(s)),
        }
    }
}

impl SortColumn<WeatherForecast> for ForecastSortColumn {
    fn column_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Date => "date",
            Self::TemperatureC => "temperature_c",
            Self::TemperatureF => "temperature_f",
            Self::Summary => "LOWER(summary)",
            Self::CreatedDate => "created_date",
        }
    }

    fn compare(&self, a: &WeatherForecast, b: &WeatherForecast) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Date => a.date.cmp(&b.date),
            Self::TemperatureC => a.temperature_c.cmp(&b.temperature_c),
            Self::TemperatureF => a.temperature_f.cmp(&b.temperature_f),
            Self::Summary => a.summary.to_lowercase().cmp(&b.summary.to_lowercase()),
            Self::CreatedDate => a.audit.created_date.cmp(&b.audit.created_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()
    }

    #[test]
    fn test_fahrenheit_truncates_toward_zero() {
        assert_eq!(celsius_to_fahrenheit(25), 76);
        assert_eq!(celsius_to_fahrenheit(15), 58);
        assert_eq!(celsius_to_fahrenheit(0), 32);
        assert_eq!(celsius_to_fahrenheit(-10), 15);
    }

    #[test]
    fn test_set_temperature_keeps_fahrenheit_in_step() {
        let mut forecast = WeatherForecast::new(date(), 5, "Cold");
        forecast.set_temperature_c(35);
        assert_eq!(forecast.temperature_f, celsius_to_fahrenheit(35));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let forecast = WeatherForecast::new(date(), 25, "Very Hot");
        assert!(forecast.matches_search("hot"));
        assert!(forecast.matches_search("VERY"));
        assert!(!forecast.matches_search("cold"));
    }

    #[test]
    fn test_sort_column_parsing() {
        assert_eq!("temperatureC".parse::<ForecastSortColumn>().unwrap(), ForecastSortColumn::TemperatureC);
        assert_eq!("temperature_c".parse::<ForecastSortColumn>().unwrap(), ForecastSortColumn::TemperatureC);
        assert_eq!("CreatedDate".parse::<ForecastSortColumn>().unwrap(), ForecastSortColumn::CreatedDate);
        assert!("RowVersion; DROP TABLE".parse::<ForecastSortColumn>().is_err());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let forecast = WeatherForecast::new(date(), 25, "Hot");
        let json = serde_json::to_value(&forecast).unwrap();
        assert_eq!(json["temperatureC"], 25);
        assert_eq!(json["temperatureF"], 76);
        assert_eq!(json["date"], "2025-01-14");
        assert_eq!(json["createdBy"], "System");
        assert!(json.get("audit").is_none());
    }

    #[test]
    fn test_nil_id_has_no_identity() {
        let forecast = WeatherForecast::new(date(), 25, "Hot").with_id(ForecastId::nil());
        assert!(!forecast.has_identity());
    }
}

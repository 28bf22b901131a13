//! Forecast validation rules
//!
//! # Validation Rules
//!
//! - Summary is required and at most 100 characters
//! - Celsius temperature must lie between absolute zero and 1000
//! - The creating user is required and at most 100 characters
//! - Fahrenheit must agree with Celsius (warning only, it is re-derived on save)

use crate::error::ForecastError;
use crate::forecast::{celsius_to_fahrenheit, WeatherForecast};

/// Maximum length of text columns
pub const MAX_TEXT_LENGTH: usize = 100;

/// Lowest accepted Celsius value
pub const MIN_TEMPERATURE_C: i32 = -273;

/// Highest accepted Celsius value
pub const MAX_TEMPERATURE_C: i32 = 1000;

/// Result of forecast validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the forecast is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Converts into a `Result`, joining all errors into one message
    pub fn into_result(self) -> Result<(), ForecastError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ForecastError::validation_failed(self.errors))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for forecasts, run before every save
pub struct ForecastValidator;

impl ForecastValidator {
    pub fn validate(forecast: &WeatherForecast) -> ValidationResult {
        let mut result = ValidationResult::ok();

        let summary = forecast.summary.trim();
        if summary.is_empty() {
            result.add_error("Summary is required");
        } else if summary.chars().count() > MAX_TEXT_LENGTH {
            result.add_error(format!(
                "Summary must be at most {} characters",
                MAX_TEXT_LENGTH
            ));
        }

        if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&forecast.temperature_c) {
            result.add_error(ForecastError::TemperatureOutOfRange(forecast.temperature_c).to_string());
        }

        let created_by = forecast.audit.created_by.trim();
        if created_by.is_empty() {
            result.add_error("CreatedBy is required");
        } else if created_by.chars().count() > MAX_TEXT_LENGTH {
            result.add_error(format!(
                "CreatedBy must be at most {} characters",
                MAX_TEXT_LENGTH
            ));
        }

        if forecast.temperature_f != celsius_to_fahrenheit(forecast.temperature_c) {
            result.add_warning("TemperatureF does not match TemperatureC and will be recalculated");
        }

        result
    }
}

//! Forecast domain errors

use thiserror::Error;

/// Errors that can occur in the forecast domain
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// Invalid forecast data provided
    #[error("Invalid forecast data: {0}")]
    InvalidData(String),

    /// Temperature is outside the physically meaningful range
    #[error("Temperature out of range: {0}")]
    TemperatureOutOfRange(i32),

    /// Forecast validation failed
    #[error("Forecast validation failed: {0}")]
    ValidationFailed(String),
}

impl ForecastError {
    /// Creates an InvalidData error with a message
    pub fn invalid(message: impl Into<String>) -> Self {
        ForecastError::InvalidData(message.into())
    }

    /// Creates a ValidationFailed error from validation errors
    pub fn validation_failed(errors: Vec<String>) -> Self {
        ForecastError::ValidationFailed(errors.join("; "))
    }
}

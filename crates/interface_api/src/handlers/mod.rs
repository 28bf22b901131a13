//! Request handlers

pub mod forecast_v1;
pub mod forecast_v2;
pub mod health;

use core_kernel::ForecastId;

use crate::error::ApiError;

/// Parses a forecast id taken from the request path
pub(crate) fn parse_forecast_id(raw: &str) -> Result<ForecastId, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("Id is required.".to_string()));
    }
    Ok(raw.parse::<ForecastId>()?)
}

//! Forecast DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ForecastId;
use domain_forecast::WeatherForecast;

use crate::error::ApiError;

/// Body of a create or update request
///
/// `temperatureF` may be sent but is ignored; it is always derived from
/// `temperatureC`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    /// Client-chosen id for a create; ignored by updates
    pub id: Option<ForecastId>,
    #[validate(required(message = "Date is required"))]
    pub date: Option<NaiveDate>,
    #[validate(
        required(message = "TemperatureC is required"),
        range(min = -273, max = 1000, message = "TemperatureC must be between -273 and 1000")
    )]
    pub temperature_c: Option<i32>,
    #[validate(length(max = 100, message = "Summary must be at most 100 characters"))]
    pub summary: Option<String>,
    /// Concurrency token the client last read
    pub version: Option<Uuid>,
}

impl ForecastRequest {
    /// Builds a new forecast; a missing id gets a fresh one
    pub fn into_forecast(self) -> Result<WeatherForecast, ApiError> {
        let (date, temperature_c) = self.required_fields()?;
        let forecast = WeatherForecast::new(date, temperature_c, self.summary.unwrap_or_default());
        Ok(match self.id {
            Some(id) => forecast.with_id(id),
            None => forecast,
        })
    }

    /// Copies the editable fields onto the persisted forecast
    ///
    /// The stored token is kept when the request does not carry one, which
    /// makes the update last-writer-wins.
    pub fn apply_to(self, mut forecast: WeatherForecast) -> Result<WeatherForecast, ApiError> {
        let (date, temperature_c) = self.required_fields()?;
        forecast.date = date;
        forecast.set_temperature_c(temperature_c);
        forecast.summary = self.summary.unwrap_or_default();
        if let Some(version) = self.version {
            forecast.audit.version = version;
        }
        Ok(forecast)
    }

    fn required_fields(&self) -> Result<(NaiveDate, i32), ApiError> {
        match (self.date, self.temperature_c) {
            (Some(date), Some(temperature_c)) => Ok((date, temperature_c)),
            _ => Err(ApiError::validation(vec![
                "date and temperatureC are required".to_string()
            ])),
        }
    }
}

/// Query string of the version-aware delete
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    pub version: Option<Uuid>,
}

/// A forecast as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub id: String,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: String,
    pub version: Uuid,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
}

impl From<WeatherForecast> for ForecastResponse {
    fn from(forecast: WeatherForecast) -> Self {
        Self {
            id: forecast.id.to_string(),
            date: forecast.date,
            temperature_c: forecast.temperature_c,
            temperature_f: forecast.temperature_f,
            summary: forecast.summary,
            version: forecast.audit.version,
            created_by: forecast.audit.created_by,
            created_date: forecast.audit.created_date,
            modified_date: forecast.audit.modified_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(temperature_c: i32) -> ForecastRequest {
        ForecastRequest {
            date: NaiveDate::from_ymd_opt(2025, 3, 1),
            temperature_c: Some(temperature_c),
            summary: Some("Mild".to_string()),
            ..ForecastRequest::default()
        }
    }

    #[test]
    fn test_missing_date_and_temperature_fail_validation() {
        let errors = ForecastRequest::default().validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("temperature_c"));
    }

    #[test]
    fn test_camel_case_body_deserializes() {
        let body = r#"{"date":"2025-01-14","temperatureC":12,"temperatureF":999,"summary":"Cool"}"#;
        let request: ForecastRequest = serde_json::from_str(body).unwrap();

        assert!(request.validate().is_ok());
        let forecast = request.into_forecast().unwrap();
        assert_eq!(forecast.temperature_f, domain_forecast::celsius_to_fahrenheit(12));
        assert!(!forecast.id.is_nil());
    }

    #[test]
    fn test_apply_to_keeps_identity_and_audit() {
        let existing = WeatherForecast::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 1, "Cold");
        let stored_version = existing.audit.version;

        let updated = request(30).apply_to(existing.clone()).unwrap();

        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.audit.version, stored_version);
        assert_eq!(updated.temperature_c, 30);
        assert_eq!(updated.summary, "Mild");
    }

    #[test]
    fn test_apply_to_uses_client_token() {
        let existing = WeatherForecast::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 1, "Cold");
        let token = Uuid::new_v4();

        let updated = ForecastRequest {
            version: Some(token),
            ..request(2)
        }
        .apply_to(existing)
        .unwrap();

        assert_eq!(updated.audit.version, token);
    }

    #[test]
    fn test_response_exposes_token() {
        let forecast = WeatherForecast::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 1, "Cold");
        let json = serde_json::to_value(ForecastResponse::from(forecast.clone())).unwrap();

        assert_eq!(json["id"], forecast.id.to_string());
        assert_eq!(json["temperatureC"], 1);
        assert!(json.get("version").is_some());
        assert!(json.get("modifiedDate").is_none());
    }

    proptest! {
        #[test]
        fn prop_range_validation_matches_bounds(t in -400i32..1200) {
            let valid = request(t).validate().is_ok();
            prop_assert_eq!(valid, (-273..=1000).contains(&t));
        }
    }
}

//! Forecast repository

use async_trait::async_trait;
use tracing::{debug, info};

use core_kernel::EntityState;
use domain_forecast::{ForecastValidator, WeatherForecast};

use crate::error::RepositoryError;
use crate::hooks::SaveHooks;
use crate::repository::SqlRepository;
use crate::store::{Change, SharedStore};

/// Forecast repository over any store, a shared handle by default
pub type ForecastRepository<S = SharedStore<WeatherForecast>> =
    SqlRepository<WeatherForecast, S, ForecastHooks>;

/// Save hooks for forecasts
///
/// Rejects invalid forecasts before anything is stamped and re-derives the
/// Fahrenheit value right before the commit, so a client can never persist
/// a mismatched pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastHooks;

#[async_trait]
impl SaveHooks<WeatherForecast> for ForecastHooks {
    async fn validate_before_save(
        &self,
        pending: &[Change<WeatherForecast>],
    ) -> Result<(), RepositoryError> {
        let mut errors = Vec::new();

        for change in pending.iter().filter(|c| c.state != EntityState::Deleted) {
            let result = ForecastValidator::validate(&change.entity);
            for warning in &result.warnings {
                debug!(id = %change.entity.id, %warning, "Forecast validation warning");
            }
            errors.extend(result.errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::validation(errors.join("; ")))
        }
    }

    async fn before_save(
        &self,
        pending: &mut [Change<WeatherForecast>],
    ) -> Result<(), RepositoryError> {
        for change in pending.iter_mut() {
            if change.state != EntityState::Deleted {
                change.entity.sync_fahrenheit();
            }
            info!(
                entity = "WeatherForecast",
                id = %change.entity.id,
                state = %change.state,
                "Saving entity"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_forecast::seed_forecasts;
    use uuid::Uuid;

    fn change(state: EntityState, entity: WeatherForecast) -> Change<WeatherForecast> {
        Change {
            state,
            entity,
            original_version: Uuid::nil(),
        }
    }

    #[tokio::test]
    async fn test_validation_collects_all_errors() {
        let mut forecast = seed_forecasts().remove(0);
        forecast.summary = String::new();
        forecast.temperature_c = -500;

        let err = ForecastHooks
            .validate_before_save(&[change(EntityState::Added, forecast)])
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Summary is required"));
        assert!(message.contains("-500"));
    }

    #[tokio::test]
    async fn test_deleted_forecasts_are_not_validated() {
        let mut forecast = seed_forecasts().remove(0);
        forecast.summary = String::new();

        let result = ForecastHooks
            .validate_before_save(&[change(EntityState::Deleted, forecast)])
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_before_save_recomputes_fahrenheit() {
        let mut forecast = seed_forecasts().remove(0);
        forecast.temperature_c = 35;
        let mut pending = [change(EntityState::Modified, forecast)];

        ForecastHooks.before_save(&mut pending).await.unwrap();

        assert_eq!(pending[0].entity.temperature_f, 94);
    }
}

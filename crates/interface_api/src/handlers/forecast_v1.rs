//! Forecast handlers, version 1

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::{PagedResult, PaginationQuery};
use domain_forecast::WeatherForecast;
use infra_db::Repository;

use super::parse_forecast_id;
use crate::dto::forecast::{ForecastRequest, ForecastResponse};
use crate::{error::ApiError, AppState};

/// Lists every forecast
pub async fn list_forecasts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ForecastResponse>>, ApiError> {
    let forecasts = state.forecast_repository().filter_no_tracking().await?;
    Ok(Json(forecasts.into_iter().map(ForecastResponse::from).collect()))
}

/// One page of forecasts, optionally searched and sorted
pub async fn list_forecasts_paged(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<PagedResult<ForecastResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = state.forecast_repository().filter_paginated(&query).await?;
    Ok(Json(page.map(ForecastResponse::from)))
}

/// Gets a forecast by ID
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let id = parse_forecast_id(&id)?;
    let forecast = state
        .forecast_repository()
        .filter_by_id(&id.to_string())
        .await?;
    Ok(Json(forecast.into()))
}

/// Creates a forecast and points `Location` at it
pub async fn create_forecast(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<ForecastResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;

    let created = state
        .forecast_repository()
        .create(request.into_forecast()?)
        .await?;
    info!(id = %created.id, "Forecast created");

    let location = format!("/api/v1/weatherforecast/{}", created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created.into()),
    ))
}

/// Replaces the editable fields of a forecast
pub async fn update_forecast(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_forecast_id(&id)?;
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;

    let mut repo = state.forecast_repository();
    let existing = repo.filter_by_id(&id.to_string()).await?;
    let forecast = request.apply_to(existing)?;

    repo.update(&move |f: &WeatherForecast| f.id == id, forecast)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a forecast by ID
pub async fn delete_forecast(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_forecast_id(&id)?;
    state
        .forecast_repository()
        .delete_by_id(&id.to_string())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

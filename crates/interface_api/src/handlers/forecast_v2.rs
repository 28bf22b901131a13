//! Forecast handlers, version 2

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
};

use infra_db::Repository;

use super::parse_forecast_id;
use crate::dto::forecast::DeleteQuery;
use crate::{error::ApiError, AppState};

/// Deletes a forecast, checking the caller's token when one is given
///
/// `DELETE /api/v2/weatherforecast/{id}?version={token}` answers 409 with
/// the current row when the token is stale. Without a token the delete
/// behaves like version 1.
pub async fn delete_forecast(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_forecast_id(&id)?;
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut repo = state.forecast_repository();
    let mut forecast = repo.filter_by_id(&id.to_string()).await?;
    if let Some(version) = query.version {
        forecast.audit.version = version;
    }

    repo.delete(forecast).await?;
    Ok(StatusCode::NO_CONTENT)
}

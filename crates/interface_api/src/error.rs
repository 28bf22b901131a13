//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::CoreError;
use infra_db::{DatabaseError, RepositoryError, StoreError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// `current` carries the latest persisted state when it is known
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        current: Option<serde_json::Value>,
    },

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ApiError {
    pub fn validation(details: Vec<String>) -> Self {
        ApiError::Validation {
            message: "One or more validation errors occurred".to_string(),
            details,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type, details, current) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None, None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None, None),
            ApiError::Validation { details, .. } => {
                (StatusCode::BAD_REQUEST, "validation_error", Some(details), None)
            }
            ApiError::Conflict { current, .. } => (StatusCode::CONFLICT, "conflict", None, current),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited", None, None),
            ApiError::Internal(_) => {
                error!(error = %message, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None, None)
            }
            ApiError::Database(_) => {
                error!(error = %message, "Database request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None, None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
            current,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        if err.is_conflict() {
            let current = match &err {
                RepositoryError::ConcurrencyConflict { current, .. } => Some(current.clone()),
                _ => None,
            };
            return ApiError::Conflict {
                message: err.to_string(),
                current,
            };
        }

        match err {
            RepositoryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RepositoryError::ValidationFailure(reasons) => {
                ApiError::validation(reasons.split("; ").map(str::to_string).collect())
            }
            RepositoryError::NullArgument(_) => ApiError::BadRequest(err.to_string()),
            RepositoryError::Store(StoreError::Database(db)) => ApiError::from(db),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::Configuration(_) => ApiError::Internal(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::validation(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_repository_errors_map_to_statuses() {
        assert_eq!(
            status_of(RepositoryError::not_found("WeatherForecast", "x").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::validation("Summary is required").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::NullArgument("id").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::Store(StoreError::DuplicateEntry("x".into())).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                RepositoryError::Store(StoreError::Database(DatabaseError::PoolExhausted)).into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_concurrency_conflict_keeps_current_values() {
        let err: ApiError = RepositoryError::ConcurrencyConflict {
            entity_type: "WeatherForecast".to_string(),
            id: "abc".to_string(),
            current: serde_json::json!({"summary": "Warm"}),
        }
        .into();

        match err {
            ApiError::Conflict { current, .. } => {
                assert_eq!(current.unwrap()["summary"], "Warm");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_failure_splits_reasons() {
        let err: ApiError =
            RepositoryError::validation("Summary is required; Created by is required").into();

        match err {
            ApiError::Validation { details, .. } => assert_eq!(details.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rate_limited_is_429() {
        assert_eq!(status_of(ApiError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
    }
}

//! HTTP API Layer
//!
//! This crate provides the REST API for the weather forecast service using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: forecast routes (v1, v2) and health checks
//! - **Middleware**: activity logging, rate limiting, tracing, request ids
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent JSON error responses
//!
//! Handlers build a fresh repository from the shared store handles on every
//! request, so no session state outlives a request.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, config::ApiConfig, AppState};
//!
//! let app = create_router(AppState::in_memory(ApiConfig::default()));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    http::HeaderName,
    middleware as axum_middleware,
    routing::{delete, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_forecast::{seed_forecasts, UserActivityLog, WeatherForecast};
use infra_db::{
    ActivityHooks, ActivityRepository, DatabaseHealth, ForecastHooks, ForecastRepository,
    InMemoryStore, SharedStore,
};

use crate::config::ApiConfig;
use crate::handlers::{forecast_v1, forecast_v2, health};
use crate::middleware::activity_log_middleware;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub forecasts: SharedStore<WeatherForecast>,
    pub activities: SharedStore<UserActivityLog>,
    pub database: DatabaseHealth,
    pub rate_limiter: Option<RateLimiter>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        forecasts: SharedStore<WeatherForecast>,
        activities: SharedStore<UserActivityLog>,
        database: DatabaseHealth,
        config: ApiConfig,
    ) -> Self {
        Self {
            forecasts,
            activities,
            database,
            rate_limiter: RateLimiter::from_config(&config.rate_limit),
            config: Arc::new(config),
        }
    }

    /// State backed by process-local stores, with the sample forecasts loaded
    ///
    /// The activity log keeps only the newest `activity_log_retention` entries.
    pub fn in_memory(config: ApiConfig) -> Self {
        let retention = config.application.activity_log_retention;
        Self::new(
            Arc::new(InMemoryStore::with_rows(seed_forecasts())),
            Arc::new(InMemoryStore::bounded(retention)),
            DatabaseHealth::InMemory,
            config,
        )
    }

    /// A fresh forecast session
    pub fn forecast_repository(&self) -> ForecastRepository {
        ForecastRepository::new(self.forecasts.clone(), ForecastHooks)
    }

    /// A fresh activity log session
    pub fn activity_repository(&self) -> ActivityRepository {
        ActivityRepository::new(self.activities.clone(), ActivityHooks)
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Store handles, health probe, and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (never rate limited)
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route(
            "/api/v1/healthchecksdb/test-database",
            get(health::test_database),
        );

    let forecast_v1_routes = Router::new()
        .route(
            "/",
            get(forecast_v1::list_forecasts).post(forecast_v1::create_forecast),
        )
        .route("/paged", get(forecast_v1::list_forecasts_paged))
        .route(
            "/:id",
            get(forecast_v1::get_forecast)
                .put(forecast_v1::update_forecast)
                .delete(forecast_v1::delete_forecast),
        );

    let forecast_v2_routes = Router::new().route("/:id", delete(forecast_v2::delete_forecast));

    let forecast_routes = Router::new()
        .nest("/api/v1/weatherforecast", forecast_v1_routes)
        .nest("/api/v2/weatherforecast", forecast_v2_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(health_routes)
        .merge(forecast_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            activity_log_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! PostgreSQL store tests
//!
//! These start a PostgreSQL container and need a Docker daemon. Run with
//! `cargo test -p infra_db --test postgres_tests -- --ignored`.

use uuid::Uuid;

use core_kernel::{Entity, PaginationQuery, SortDirection};
use domain_forecast::{UserActivityLog, WeatherForecast};
use infra_db::{
    migrate, ActivityHooks, DatabaseHealth, EntityStore, ForecastHooks, PgActivityStore,
    PgForecastStore, Repository, RepositoryError, SqlRepository,
};
use test_utils::{
    assert_forecast_matches, assert_non_increasing, ActivityLogBuilder, ForecastBuilder,
    ForecastFixtures, TestDatabase,
};

async fn database() -> TestDatabase {
    TestDatabase::new()
        .await
        .expect("Failed to start PostgreSQL container")
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_migration_is_idempotent_and_seeds_forecasts() {
    let db = database().await;
    migrate(db.pool()).await.unwrap();

    let store = PgForecastStore::new(db.pool().clone());
    let rows = store.load_all().await.unwrap();

    assert_eq!(rows.len(), 5);
    let hot = store
        .load(&ForecastFixtures::hot_id().to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hot, ForecastFixtures::hot());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_update_delete_round_trip() {
    let db = database().await;
    let mut repo = SqlRepository::new(PgForecastStore::new(db.pool().clone()), ForecastHooks);

    let forecast = ForecastBuilder::new().with_summary("Chilly").with_temperature(3).build();
    let created = repo.create(forecast.clone()).await.unwrap();
    let loaded = repo.filter_by_id(&created.id()).await.unwrap();
    assert_forecast_matches(&loaded, &forecast);

    let mut edited = loaded.clone();
    edited.set_temperature_c(4);
    let id = edited.id;
    let updated = repo
        .update(&move |f: &WeatherForecast| f.id == id, edited)
        .await
        .unwrap();
    assert_eq!(updated.audit.created_date, loaded.audit.created_date);
    assert!(updated.audit.modified_date.is_some());

    repo.delete(updated).await.unwrap();
    assert!(repo.filter_by_id(&id.to_string()).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_stale_token_conflicts_and_retry_succeeds() {
    let db = database().await;
    let store = PgForecastStore::new(db.pool().clone());

    sqlx::query("UPDATE weather_forecast SET summary = 'Elsewhere', row_version = $1 WHERE id = $2")
        .bind(Uuid::new_v4())
        .bind(ForecastFixtures::hot_id().to_string())
        .execute(db.pool())
        .await
        .unwrap();

    let mut repo = SqlRepository::new(store.clone(), ForecastHooks);
    let mut mine = ForecastFixtures::hot();
    mine.summary = "Mine".to_string();

    let err = repo.update(&|_: &WeatherForecast| true, mine.clone()).await.unwrap_err();
    match err {
        RepositoryError::ConcurrencyConflict { current, .. } => {
            assert_eq!(current["summary"], "Elsewhere");
        }
        other => panic!("expected a concurrency conflict, got {other:?}"),
    }

    assert_eq!(repo.save_changes().await.unwrap(), 1);
    let persisted = store.load(&mine.id()).await.unwrap().unwrap();
    assert_eq!(persisted.summary, "Mine");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_paginated_sort_and_search() {
    let db = database().await;
    let repo = SqlRepository::new(PgForecastStore::new(db.pool().clone()), ForecastHooks);

    let query = PaginationQuery::new(1, 3).sorted_by("temperatureC", SortDirection::Desc);
    let page = repo.filter_paginated(&query).await.unwrap();
    let temperatures: Vec<i32> = page.items.iter().map(|f| f.temperature_c).collect();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_pages(), 2);
    assert_non_increasing(&temperatures);

    let query = PaginationQuery::new(1, 10).with_search("HOT");
    let page = repo.filter_paginated(&query).await.unwrap();
    assert_eq!(page.total_count, 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_activity_entries_are_truncated_and_stored() {
    let db = database().await;
    let mut repo = SqlRepository::new(PgActivityStore::new(db.pool().clone()), ActivityHooks);

    let entry = ActivityLogBuilder::new()
        .request("GET", "/api/v1/weatherforecast")
        .status(200)
        .request_headers("x".repeat(6000))
        .build();
    let created = repo.create(entry).await.unwrap();

    let loaded = repo.filter_by_id(&created.id()).await.unwrap();
    assert_eq!(loaded.request_headers.map(|h| h.len()), Some(4000));
    assert_eq!(loaded.response_status_code, Some(200));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_activity_update_rewrites_every_column() {
    let db = database().await;
    let store = PgActivityStore::new(db.pool().clone());
    let mut repo = SqlRepository::new(store.clone(), ActivityHooks);

    let created = repo
        .create(
            ActivityLogBuilder::new()
                .request("GET", "/api/v1/weatherforecast")
                .status(200)
                .build(),
        )
        .await
        .unwrap();

    let mut edited = created.clone();
    edited.request_path = Some("/api/v1/weatherforecast/paged".to_string());
    edited.request_body = Some("{}".to_string());
    edited.host = Some("worker-2".to_string());
    edited.response_status_code = Some(204);
    let id = edited.id;
    repo.update(&move |e: &UserActivityLog| e.id == id, edited)
        .await
        .unwrap();

    let persisted = store.load(&created.id()).await.unwrap().unwrap();
    assert_eq!(persisted.request_path.as_deref(), Some("/api/v1/weatherforecast/paged"));
    assert_eq!(persisted.request_body.as_deref(), Some("{}"));
    assert_eq!(persisted.host.as_deref(), Some("worker-2"));
    assert_eq!(persisted.response_status_code, Some(204));
    assert_ne!(persisted.audit.version, created.audit.version);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_database_health_reports_server_time() {
    let db = database().await;
    let health = DatabaseHealth::Postgres(db.pool().clone());

    let now = health.server_time().await.unwrap();
    assert!(!now.is_empty());
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, QueryBuilder};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{AuditFields, EntityState};
use domain_forecast::WeatherForecast;

use super::{count_from, finish_commit, push_page, push_search};
use crate::error::StoreError;
use crate::store::{Change, EntityStore, QuerySpec};

const SELECT_FORECAST: &str = "SELECT id, date, temperature_c, temperature_f, summary, \
     row_version, created_by, created_date, modified_date FROM weather_forecast";

const SEARCH_COLUMNS: [&str; 2] = ["summary", "id"];

#[derive(Debug, sqlx::FromRow)]
struct ForecastRow {
    id: String,
    date: NaiveDate,
    temperature_c: i32,
    temperature_f: i32,
    summary: String,
    row_version: Uuid,
    created_by: String,
    created_date: DateTime<Utc>,
    modified_date: Option<DateTime<Utc>>,
}

impl TryFrom<ForecastRow> for WeatherForecast {
    type Error = StoreError;

    fn try_from(row: ForecastRow) -> Result<Self, Self::Error> {
        Ok(WeatherForecast {
            id: row
                .id
                .parse()
                .map_err(|e: core_kernel::CoreError| StoreError::Serialization(e.to_string()))?,
            date: row.date,
            temperature_c: row.temperature_c,
            temperature_f: row.temperature_f,
            summary: row.summary,
            audit: AuditFields {
                version: row.row_version,
                created_by: row.created_by,
                created_date: row.created_date,
                modified_date: row.modified_date,
            },
        })
    }
}

fn into_forecasts(rows: Vec<ForecastRow>) -> Result<Vec<WeatherForecast>, StoreError> {
    rows.into_iter().map(WeatherForecast::try_from).collect()
}

/// Stores forecasts in the `weather_forecast` table
#[derive(Debug, Clone)]
pub struct PgForecastStore {
    pool: PgPool,
}

impl PgForecastStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<WeatherForecast> for PgForecastStore {
    #[instrument(skip(self))]
    async fn load_all(&self) -> Result<Vec<WeatherForecast>, StoreError> {
        let rows = sqlx::query_as::<_, ForecastRow>(&format!("{SELECT_FORECAST} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        into_forecasts(rows)
    }

    #[instrument(skip(self))]
    async fn load(&self, id: &str) -> Result<Option<WeatherForecast>, StoreError> {
        let row = sqlx::query_as::<_, ForecastRow>(&format!("{SELECT_FORECAST} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(WeatherForecast::try_from).transpose()
    }

    #[instrument(skip(self, spec))]
    async fn count(&self, spec: &QuerySpec<WeatherForecast>) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM weather_forecast");
        push_search(&mut builder, &SEARCH_COLUMNS, spec.search.as_deref());

        let total: i64 = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count_from(total))
    }

    #[instrument(skip(self, spec))]
    async fn fetch_page(
        &self,
        spec: &QuerySpec<WeatherForecast>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<WeatherForecast>, StoreError> {
        let mut builder = QueryBuilder::new(SELECT_FORECAST);
        push_search(&mut builder, &SEARCH_COLUMNS, spec.search.as_deref());
        push_page(&mut builder, &spec.order_by(), offset, limit);

        let rows = builder
            .build_query_as::<ForecastRow>()
            .fetch_all(&self.pool)
            .await?;
        into_forecasts(rows)
    }

    #[instrument(skip_all, fields(changes = changes.len()))]
    async fn commit(&self, changes: Vec<Change<WeatherForecast>>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut conflicts = Vec::new();
        let mut written = 0;

        for change in &changes {
            let forecast = &change.entity;
            let id = forecast.id.to_string();

            let affected = match change.state {
                EntityState::Added => sqlx::query(
                    "INSERT INTO weather_forecast \
                     (id, date, temperature_c, temperature_f, summary, row_version, created_by, created_date, modified_date) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(&id)
                .bind(forecast.date)
                .bind(forecast.temperature_c)
                .bind(forecast.temperature_f)
                .bind(&forecast.summary)
                .bind(forecast.audit.version)
                .bind(&forecast.audit.created_by)
                .bind(forecast.audit.created_date)
                .bind(forecast.audit.modified_date)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
                EntityState::Modified => sqlx::query(
                    "UPDATE weather_forecast SET date = $2, temperature_c = $3, temperature_f = $4, \
                     summary = $5, row_version = $6, modified_date = $7 \
                     WHERE id = $1 AND row_version = $8",
                )
                .bind(&id)
                .bind(forecast.date)
                .bind(forecast.temperature_c)
                .bind(forecast.temperature_f)
                .bind(&forecast.summary)
                .bind(forecast.audit.version)
                .bind(forecast.audit.modified_date)
                .bind(change.original_version)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
                EntityState::Deleted => {
                    sqlx::query("DELETE FROM weather_forecast WHERE id = $1 AND row_version = $2")
                        .bind(&id)
                        .bind(change.original_version)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected()
                }
                EntityState::Unchanged => continue,
            };

            if affected == 0 {
                debug!(%id, state = %change.state, "Stale concurrency token");
                conflicts.push(change.conflict()?);
            } else {
                written += affected;
            }
        }

        finish_commit(tx, conflicts, written).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{AuditFields, EntityState};
use domain_forecast::UserActivityLog;

use super::{count_from, finish_commit, push_page, push_search};
use crate::error::StoreError;
use crate::store::{Change, EntityStore, QuerySpec};

const SELECT_ACTIVITY: &str = "SELECT id, source_name, os_version, host, username, domain_name, \
     address, request_method, request_path, request_time, request_body, request_headers, \
     response_headers, response_status_code, response_body, row_version, created_by, \
     created_date, modified_date FROM user_activity";

const SEARCH_COLUMNS: [&str; 4] = ["request_path", "request_method", "username", "host"];

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: String,
    source_name: Option<String>,
    os_version: Option<String>,
    host: Option<String>,
    username: Option<String>,
    domain_name: Option<String>,
    address: Option<String>,
    request_method: Option<String>,
    request_path: Option<String>,
    request_time: DateTime<Utc>,
    request_body: Option<String>,
    request_headers: Option<String>,
    response_headers: Option<String>,
    response_status_code: Option<i32>,
    response_body: Option<String>,
    row_version: Uuid,
    created_by: String,
    created_date: DateTime<Utc>,
    modified_date: Option<DateTime<Utc>>,
}

impl TryFrom<ActivityRow> for UserActivityLog {
    type Error = StoreError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(UserActivityLog {
            id: row
                .id
                .parse()
                .map_err(|e: core_kernel::CoreError| StoreError::Serialization(e.to_string()))?,
            source_name: row.source_name,
            os_version: row.os_version,
            host: row.host,
            username: row.username,
            domain_name: row.domain_name,
            address: row.address,
            request_method: row.request_method,
            request_path: row.request_path,
            request_time: row.request_time,
            request_body: row.request_body,
            request_headers: row.request_headers,
            response_headers: row.response_headers,
            response_status_code: row.response_status_code,
            response_body: row.response_body,
            audit: AuditFields {
                version: row.row_version,
                created_by: row.created_by,
                created_date: row.created_date,
                modified_date: row.modified_date,
            },
        })
    }
}

fn into_entries(rows: Vec<ActivityRow>) -> Result<Vec<UserActivityLog>, StoreError> {
    rows.into_iter().map(UserActivityLog::try_from).collect()
}

/// Stores request activity in the `user_activity` table
///
/// Entries are inserted by the logging middleware. Updates rewrite the whole
/// row and, like deletes, are checked against the original token.
#[derive(Debug, Clone)]
pub struct PgActivityStore {
    pool: PgPool,
}

impl PgActivityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<UserActivityLog> for PgActivityStore {
    async fn load_all(&self) -> Result<Vec<UserActivityLog>, StoreError> {
        let rows = sqlx::query_as::<_, ActivityRow>(&format!("{SELECT_ACTIVITY} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        into_entries(rows)
    }

    async fn load(&self, id: &str) -> Result<Option<UserActivityLog>, StoreError> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!("{SELECT_ACTIVITY} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserActivityLog::try_from).transpose()
    }

    async fn count(&self, spec: &QuerySpec<UserActivityLog>) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM user_activity");
        push_search(&mut builder, &SEARCH_COLUMNS, spec.search.as_deref());

        let total = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count_from(total))
    }

    async fn fetch_page(
        &self,
        spec: &QuerySpec<UserActivityLog>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<UserActivityLog>, StoreError> {
        let mut builder = QueryBuilder::new(SELECT_ACTIVITY);
        push_search(&mut builder, &SEARCH_COLUMNS, spec.search.as_deref());
        push_page(&mut builder, &spec.order_by(), offset, limit);

        let rows = builder
            .build_query_as::<ActivityRow>()
            .fetch_all(&self.pool)
            .await?;
        into_entries(rows)
    }

    #[instrument(skip_all, fields(changes = changes.len()))]
    async fn commit(&self, changes: Vec<Change<UserActivityLog>>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut conflicts = Vec::new();
        let mut written = 0;

        for change in &changes {
            let entry = &change.entity;
            let id = entry.id.to_string();

            let affected = match change.state {
                EntityState::Added => sqlx::query(
                    "INSERT INTO user_activity \
                     (id, source_name, os_version, host, username, domain_name, address, \
                      request_method, request_path, request_time, request_body, request_headers, \
                      response_headers, response_status_code, response_body, \
                      row_version, created_by, created_date, modified_date) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
                )
                .bind(&id)
                .bind(&entry.source_name)
                .bind(&entry.os_version)
                .bind(&entry.host)
                .bind(&entry.username)
                .bind(&entry.domain_name)
                .bind(&entry.address)
                .bind(&entry.request_method)
                .bind(&entry.request_path)
                .bind(entry.request_time)
                .bind(&entry.request_body)
                .bind(&entry.request_headers)
                .bind(&entry.response_headers)
                .bind(entry.response_status_code)
                .bind(&entry.response_body)
                .bind(entry.audit.version)
                .bind(&entry.audit.created_by)
                .bind(entry.audit.created_date)
                .bind(entry.audit.modified_date)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
                EntityState::Modified => sqlx::query(
                    "UPDATE user_activity SET source_name = $2, os_version = $3, host = $4, \
                     username = $5, domain_name = $6, address = $7, request_method = $8, \
                     request_path = $9, request_time = $10, request_body = $11, \
                     request_headers = $12, response_headers = $13, response_status_code = $14, \
                     response_body = $15, row_version = $16, modified_date = $17 \
                     WHERE id = $1 AND row_version = $18",
                )
                .bind(&id)
                .bind(&entry.source_name)
                .bind(&entry.os_version)
                .bind(&entry.host)
                .bind(&entry.username)
                .bind(&entry.domain_name)
                .bind(&entry.address)
                .bind(&entry.request_method)
                .bind(&entry.request_path)
                .bind(entry.request_time)
                .bind(&entry.request_body)
                .bind(&entry.request_headers)
                .bind(&entry.response_headers)
                .bind(entry.response_status_code)
                .bind(&entry.response_body)
                .bind(entry.audit.version)
                .bind(entry.audit.modified_date)
                .bind(change.original_version)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
                EntityState::Deleted => {
                    sqlx::query("DELETE FROM user_activity WHERE id = $1 AND row_version = $2")
                        .bind(&id)
                        .bind(change.original_version)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected()
                }
                EntityState::Unchanged => continue,
            };

            if affected == 0 {
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

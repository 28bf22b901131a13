//! Database health probe

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

use crate::error::DatabaseError;

/// Answers "is the database there, and what time does it think it is"
#[derive(Debug, Clone)]
pub enum DatabaseHealth {
    Postgres(PgPool),
    /// No database is configured; the probe reports the local clock
    InMemory,
}

impl DatabaseHealth {
    fn adapter_id(&self) -> &'static str {
        match self {
            DatabaseHealth::Postgres(_) => "postgres",
            DatabaseHealth::InMemory => "in-memory",
        }
    }

    /// Runs a trivial script against the database and returns its clock
    pub async fn server_time(&self) -> Result<String, DatabaseError> {
        match self {
            DatabaseHealth::Postgres(pool) => {
                let now: String = sqlx::query_scalar("SELECT now()::text")
                    .fetch_one(pool)
                    .await?;
                Ok(now)
            }
            DatabaseHealth::InMemory => Ok(Utc::now().to_rfc3339()),
        }
    }
}

#[async_trait]
impl HealthCheckable for DatabaseHealth {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self.server_time().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: self.adapter_id().to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_probe_is_healthy() {
        let result = DatabaseHealth::InMemory.health_check().await;
        assert!(result.is_healthy());
        assert_eq!(result.adapter_id, "in-memory");
    }
}

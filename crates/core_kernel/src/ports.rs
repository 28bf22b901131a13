//! Ports and Adapters Infrastructure
//!
//! Health types shared by every adapter. The database probe implements
//! [`HealthCheckable`]; the stores report through [`HealthCheckResult`] so the
//! HTTP layer can probe them without knowing which backend is wired in.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │     interface_api (Axum)     │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  Repository<E> / EntityStore │
//! └──────────────────────────────┘
//!          ▲              ▲
//!  ┌───────┴──────┐ ┌─────┴──────┐
//!  │ InMemoryStore│ │ Pg*Store   │
//!  └──────────────┘ └────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_result_status() {
        let result = HealthCheckResult {
            adapter_id: "memory".to_string(),
            status: AdapterHealth::Degraded,
            latency_ms: 3,
            message: None,
            checked_at: chrono::Utc::now(),
        };
        assert!(!result.is_healthy());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "degraded");
    }
}

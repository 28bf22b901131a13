//! API configuration
//!
//! Values are layered: built-in defaults, then an optional
//! `config/default.toml`, then environment variables prefixed with `APP__`
//! using `__` between sections (`APP__SERVER__PORT=9090`,
//! `APP__DATABASE__DB_TYPE=postgres`).

use std::time::Duration;

use serde::Deserialize;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub application: ApplicationConfig,
    pub database: DatabaseSettings,
    pub rate_limit: RateLimitConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Filter directive used when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit JSON log lines instead of the human readable format
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Descriptive application settings, reported by the health endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Record every request in the activity log
    pub enable_activity_log: bool,
    /// Entries the in-memory activity log keeps before dropping the oldest
    pub activity_log_retention: usize,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "weather-forecast-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Weather forecast service".to_string(),
            enable_activity_log: true,
            activity_log_retention: 1000,
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbType {
    Postgres,
    /// Process-local store seeded with the sample forecasts
    #[default]
    InMemory,
}

/// Database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub db_type: DbType,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            db_type: DbType::InMemory,
            url: "postgres://localhost/weather".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
        }
    }
}

impl DatabaseSettings {
    /// Pool options for [`infra_db::create_pool`]
    pub fn pool_config(&self) -> infra_db::DatabaseConfig {
        infra_db::DatabaseConfig::new(self.url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Fixed-window rate limiting for the forecast routes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests admitted per window
    pub permit_limit: u32,
    pub window_secs: u64,
    /// Requests allowed to wait for the next window once permits run out
    pub queue_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            permit_limit: 100,
            window_secs: 60,
            queue_limit: 5,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Rejects an enabled limiter that would admit nothing or never close a window
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.permit_limit == 0 {
            return Err(config::ConfigError::Message(
                "rate_limit.permit_limit must be greater than zero".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(config::ConfigError::Message(
                "rate_limit.window_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ApiConfig {
    /// Loads configuration from `config/default.toml` and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let sources = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_sources(sources)
    }

    fn from_sources(sources: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = sources.try_deserialize()?;
        config.rate_limit.validate()?;
        Ok(config)
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub executor: ExecutorConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    15
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_run_migrations() -> bool {
    true
}

/// Longest accepted lookahead: one year
pub const MAX_LOOKAHEAD_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Period between scheduling cycles
    pub tick_interval_seconds: u64,
    /// How far ahead of now the due-job finder looks
    pub lookahead_seconds: u64,
    pub dispatch_queue_capacity: usize,
    pub result_queue_capacity: usize,
    #[serde(default = "default_true")]
    pub cache_templates: bool,
    #[serde(default = "default_true")]
    pub skip_in_flight: bool,
}

fn default_true() -> bool {
    true
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lookahead_seconds.min(MAX_LOOKAHEAD_SECONDS) as i64)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 30,
            lookahead_seconds: 2 * 60 * 60,
            dispatch_queue_capacity: 100,
            result_queue_capacity: 100,
            cache_templates: true,
            skip_in_flight: true,
        }
    }
}

/// How a remote function's status code is turned into success or failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Failure when `status % 10 > 2`
    #[default]
    LastDigit,
    /// Failure outside 200..=299 or when the function reports an error
    SuccessRange,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Upper bound on an outbound HTTP invocation; unbounded when absent
    #[serde(default)]
    pub http_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub status_policy: StatusPolicy,
    #[serde(default)]
    pub aws_region: Option<String>,
}

impl ExecutorConfig {
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides, not committed
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("CADENCE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.server.request_timeout_seconds == 0 {
            return Err("Server request_timeout_seconds must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.scheduler.tick_interval_seconds == 0 {
            return Err("Scheduler tick_interval_seconds must be greater than 0".to_string());
        }
        if self.scheduler.lookahead_seconds > MAX_LOOKAHEAD_SECONDS {
            return Err(format!(
                "Scheduler lookahead_seconds must not exceed {}",
                MAX_LOOKAHEAD_SECONDS
            ));
        }
        if self.scheduler.dispatch_queue_capacity == 0 {
            return Err("Scheduler dispatch_queue_capacity must be greater than 0".to_string());
        }
        if self.scheduler.result_queue_capacity == 0 {
            return Err("Scheduler result_queue_capacity must be greater than 0".to_string());
        }

        if self.executor.http_timeout_seconds == Some(0) {
            return Err("Executor http_timeout_seconds must be greater than 0 when set".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                request_timeout_seconds: default_request_timeout_seconds(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/cadence".to_string(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_seconds: 30,
                run_migrations: true,
            },
            scheduler: SchedulerConfig::default(),
            executor: ExecutorConfig::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
                tracing_endpoint: None,
            },
        }
    }
}

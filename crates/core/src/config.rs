//! Configuration loading for the expiry service
//!
//! Environment-first configuration with typed parsing, validation, and .env
//! support. All variables use the `MEDIA_EXPIRY_` prefix, with unprefixed
//! fallbacks for the conventional names (`DATABASE_URL`, `PORT`, `RUST_LOG`).

use crate::error::ExpiryError;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Configuration loader trait
///
/// Standardized loading and validation of configuration from environment
/// variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables, with defaults for
    /// missing optional values.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryError::Configuration` if a required variable is
    /// missing or a value cannot be parsed.
    fn from_env() -> Result<Self, ExpiryError>;

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryError::Configuration` if any check fails.
    fn validate(&self) -> Result<(), ExpiryError>;
}

/// Database configuration
///
/// # Environment Variables
///
/// - `MEDIA_EXPIRY_DATABASE_URL` (required, falls back to `DATABASE_URL`)
/// - `MEDIA_EXPIRY_DATABASE_MAX_CONNECTIONS` (optional, default: 10)
/// - `MEDIA_EXPIRY_DATABASE_MIN_CONNECTIONS` (optional, default: 1)
/// - `MEDIA_EXPIRY_DATABASE_ACQUIRE_TIMEOUT` (optional, seconds, default: 30)
/// - `MEDIA_EXPIRY_DATABASE_IDLE_TIMEOUT` (optional, seconds, default: 600)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection acquire timeout
    pub acquire_timeout: Duration,
    /// Idle connection timeout
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/media_expiry".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl ConfigLoader for DatabaseConfig {
    fn from_env() -> Result<Self, ExpiryError> {
        let url = std::env::var("MEDIA_EXPIRY_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| {
                ExpiryError::configuration_for(
                    "MEDIA_EXPIRY_DATABASE_URL",
                    "DATABASE_URL or MEDIA_EXPIRY_DATABASE_URL must be set",
                )
            })?;

        let defaults = DatabaseConfig::default();
        let max_connections = parse_env_var(
            "MEDIA_EXPIRY_DATABASE_MAX_CONNECTIONS",
            defaults.max_connections,
        )?;
        let min_connections = parse_env_var(
            "MEDIA_EXPIRY_DATABASE_MIN_CONNECTIONS",
            defaults.min_connections,
        )?;
        let acquire_timeout_secs = parse_env_var("MEDIA_EXPIRY_DATABASE_ACQUIRE_TIMEOUT", 30u64)?;
        let idle_timeout_secs = parse_env_var("MEDIA_EXPIRY_DATABASE_IDLE_TIMEOUT", 600u64)?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), ExpiryError> {
        Url::parse(&self.url).map_err(|e| {
            ExpiryError::configuration_for(
                "MEDIA_EXPIRY_DATABASE_URL",
                format!("Invalid DATABASE_URL: {}", e),
            )
        })?;

        if self.max_connections == 0 {
            return Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_DATABASE_MAX_CONNECTIONS",
                "max_connections must be greater than 0",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_DATABASE_MIN_CONNECTIONS",
                format!(
                    "min_connections ({}) cannot exceed max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            ));
        }

        if self.acquire_timeout.as_secs() == 0 {
            return Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_DATABASE_ACQUIRE_TIMEOUT",
                "acquire_timeout must be greater than 0 seconds",
            ));
        }

        Ok(())
    }
}

/// Policy applied when a selected asset fails its predicate check
///
/// A violation always indicates a defect in the query layer or the data; the
/// policy only decides whether the run keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvariantPolicy {
    /// Roll back and fail the run (safer)
    #[default]
    Abort,
    /// Skip the offending asset and continue the pass (more available)
    Skip,
}

impl InvariantPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvariantPolicy::Abort => "abort",
            InvariantPolicy::Skip => "skip",
        }
    }
}

impl FromStr for InvariantPolicy {
    type Err = ExpiryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(InvariantPolicy::Abort),
            "skip" => Ok(InvariantPolicy::Skip),
            other => Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_INVARIANT_POLICY",
                format!("Invalid invariant policy '{}'. Must be 'abort' or 'skip'", other),
            )),
        }
    }
}

/// Expiration checker configuration
///
/// # Environment Variables
///
/// - `MEDIA_EXPIRY_INVARIANT_POLICY` (optional): "abort" or "skip" (default: "abort")
/// - `MEDIA_EXPIRY_CHECK_INTERVAL` (optional): seconds between scheduled
///   runs; 0 disables the scheduler (default: 3600)
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// What to do when a selected asset fails its predicate
    pub invariant_policy: InvariantPolicy,
    /// How often the background scheduler triggers a run, in seconds
    pub check_interval_seconds: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            invariant_policy: InvariantPolicy::Abort,
            check_interval_seconds: 3600,
        }
    }
}

impl ConfigLoader for CheckerConfig {
    fn from_env() -> Result<Self, ExpiryError> {
        let invariant_policy = match std::env::var("MEDIA_EXPIRY_INVARIANT_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => InvariantPolicy::default(),
        };

        let check_interval_seconds = parse_env_var("MEDIA_EXPIRY_CHECK_INTERVAL", 3600u64)?;

        Ok(Self {
            invariant_policy,
            check_interval_seconds,
        })
    }

    fn validate(&self) -> Result<(), ExpiryError> {
        // Any interval is acceptable; 0 means the scheduler is disabled and
        // runs are trigger-only.
        Ok(())
    }
}

/// HTTP service configuration
///
/// # Environment Variables
///
/// - `MEDIA_EXPIRY_SERVICE_HOST` (optional, default: "0.0.0.0")
/// - `MEDIA_EXPIRY_SERVICE_PORT` (optional, falls back to `PORT`, default: 8086)
/// - `MEDIA_EXPIRY_SERVICE_WORKERS` (optional, default: CPU count)
/// - `MEDIA_EXPIRY_SERVICE_LOG_LEVEL` (optional, default: "info"). A set
///   `RUST_LOG` overrides this at subscriber setup, where full filter
///   directives are accepted.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service bind host
    pub host: String,
    /// Service bind port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8086,
            workers: num_cpus::get(),
            log_level: "info".to_string(),
        }
    }
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self, ExpiryError> {
        let defaults = ServiceConfig::default();

        let host = std::env::var("MEDIA_EXPIRY_SERVICE_HOST").unwrap_or(defaults.host);

        let port = match std::env::var("MEDIA_EXPIRY_SERVICE_PORT")
            .or_else(|_| std::env::var("PORT"))
        {
            Ok(value) => value.parse::<u16>().map_err(|e| {
                ExpiryError::configuration_for(
                    "MEDIA_EXPIRY_SERVICE_PORT",
                    format!("Failed to parse port: {}", e),
                )
            })?,
            Err(_) => defaults.port,
        };

        let workers = parse_env_var("MEDIA_EXPIRY_SERVICE_WORKERS", defaults.workers)?;

        let log_level =
            std::env::var("MEDIA_EXPIRY_SERVICE_LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Self {
            host,
            port,
            workers,
            log_level,
        })
    }

    fn validate(&self) -> Result<(), ExpiryError> {
        if self.port == 0 {
            return Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_SERVICE_PORT",
                "port must be greater than 0",
            ));
        }

        if self.workers == 0 {
            return Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_SERVICE_WORKERS",
                "workers must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ExpiryError::configuration_for(
                "MEDIA_EXPIRY_SERVICE_LOG_LEVEL",
                format!(
                    "Invalid log_level '{}'. Must be one of: {}",
                    self.log_level,
                    valid_log_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T>(key: &str, default: T) -> Result<T, ExpiryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.parse::<T>().map_err(|e| {
                ExpiryError::configuration_for(key, format!("Failed to parse {}: {}", key, e))
            })
        })
        .unwrap_or(Ok(default))
}

/// Load a .env file if present
///
/// Does not fail when the file is missing.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn set_test_env(key: &str, value: &str) {
        env::set_var(key, value);
    }

    fn clear_test_env(key: &str) {
        env::remove_var(key);
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_database_config_validation_invalid_url() {
        let config = DatabaseConfig {
            url: "not-a-valid-url".to_string(),
            ..DatabaseConfig::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ExpiryError::Configuration { .. }
        ));
    }

    #[test]
    fn test_database_config_validation_min_exceeds_max() {
        let config = DatabaseConfig {
            url: "postgresql://localhost/test".to_string(),
            min_connections: 20,
            max_connections: 10,
            ..DatabaseConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invariant_policy_parsing() {
        assert_eq!(
            "abort".parse::<InvariantPolicy>().unwrap(),
            InvariantPolicy::Abort
        );
        assert_eq!(
            "SKIP".parse::<InvariantPolicy>().unwrap(),
            InvariantPolicy::Skip
        );
        assert!("tolerate".parse::<InvariantPolicy>().is_err());
    }

    #[test]
    fn test_invariant_policy_default_is_abort() {
        assert_eq!(InvariantPolicy::default(), InvariantPolicy::Abort);
        assert_eq!(CheckerConfig::default().invariant_policy, InvariantPolicy::Abort);
    }

    #[test]
    fn test_checker_config_from_env() {
        set_test_env("MEDIA_EXPIRY_INVARIANT_POLICY", "skip");
        set_test_env("MEDIA_EXPIRY_CHECK_INTERVAL", "60");

        let config = CheckerConfig::from_env().unwrap();
        assert_eq!(config.invariant_policy, InvariantPolicy::Skip);
        assert_eq!(config.check_interval_seconds, 60);

        clear_test_env("MEDIA_EXPIRY_INVARIANT_POLICY");
        clear_test_env("MEDIA_EXPIRY_CHECK_INTERVAL");
    }

    #[test]
    fn test_checker_config_rejects_unknown_policy() {
        set_test_env("MEDIA_EXPIRY_INVARIANT_POLICY", "ignore");
        let result = CheckerConfig::from_env();
        clear_test_env("MEDIA_EXPIRY_INVARIANT_POLICY");
        assert!(result.is_err());
    }

    #[test]
    fn test_service_config_default() {
        let config = ServiceConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8086);
        assert_eq!(config.log_level, "info");
        assert!(config.workers > 0);
    }

    #[test]
    fn test_service_config_port_falls_back_to_unprefixed() {
        clear_test_env("MEDIA_EXPIRY_SERVICE_PORT");
        set_test_env("PORT", "9999");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.port, 9999);

        // The prefixed variable wins when both are set
        set_test_env("MEDIA_EXPIRY_SERVICE_PORT", "9001");
        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.port, 9001);

        clear_test_env("MEDIA_EXPIRY_SERVICE_PORT");
        clear_test_env("PORT");
    }

    #[test]
    fn test_service_config_log_level_ignores_rust_log_directives() {
        // RUST_LOG may hold full filter directives; those are applied at
        // subscriber setup, not parsed as a log level here.
        set_test_env("RUST_LOG", "debug,sqlx=warn");
        clear_test_env("MEDIA_EXPIRY_SERVICE_LOG_LEVEL");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());

        clear_test_env("RUST_LOG");
    }

    #[test]
    fn test_service_config_validation_invalid_log_level() {
        let config = ServiceConfig {
            log_level: "loud".to_string(),
            ..ServiceConfig::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        match result.unwrap_err() {
            ExpiryError::Configuration { message, .. } => {
                assert!(message.contains("Invalid log_level"));
            }
            _ => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_parse_env_var_with_default() {
        let result: u32 = parse_env_var("MEDIA_EXPIRY_NON_EXISTENT", 42).unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_env_var_invalid_value() {
        set_test_env("MEDIA_EXPIRY_TEST_INVALID", "not-a-number");
        let result: Result<u32, _> = parse_env_var("MEDIA_EXPIRY_TEST_INVALID", 42);
        assert!(result.is_err());
        clear_test_env("MEDIA_EXPIRY_TEST_INVALID");
    }
}

//! Repository configuration
//!
//! Page sizing for `paginate` and the PostgreSQL pool settings, loaded from
//! environment variables with framework defaults.

use std::env;
use std::str::FromStr;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub idle_timeout: Option<u64>,
    pub max_lifetime: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600),  // 10 minutes
            max_lifetime: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

impl PoolConfig {
    /// Database URL, or an error naming the variable that should carry it
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar {
                var: "DATABASE_URL".to_string(),
            })
    }
}

/// Repository configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Page size used when `paginate` is called without one
    pub per_page: u64,
    /// Upper bound for any requested page size
    pub max_per_page: u64,
    pub pool: PoolConfig,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            per_page: 15,
            max_per_page: 1000,
            pool: PoolConfig::default(),
        }
    }
}

impl RepositoryConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size
    pub fn with_per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    /// Set the pool configuration
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            per_page: env_or("REPOSITORY_PER_PAGE", defaults.per_page)?,
            max_per_page: env_or("REPOSITORY_MAX_PER_PAGE", defaults.max_per_page)?,
            pool: PoolConfig {
                database_url: env::var("DATABASE_URL").ok(),
                max_connections: env_or("DB_MAX_CONNECTIONS", defaults.pool.max_connections)?,
                min_connections: env_or("DB_MIN_CONNECTIONS", defaults.pool.min_connections)?,
                acquire_timeout: env_or("DB_ACQUIRE_TIMEOUT", defaults.pool.acquire_timeout)?,
                ..defaults.pool
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "per_page".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.per_page > self.max_per_page {
            return Err(ConfigError::ValidationFailed {
                field: "per_page".to_string(),
                reason: format!("must not exceed max_per_page ({})", self.max_per_page),
            });
        }

        if self.pool.min_connections > self.pool.max_connections {
            return Err(ConfigError::ValidationFailed {
                field: "min_connections".to_string(),
                reason: format!(
                    "must not exceed max_connections ({})",
                    self.pool.max_connections
                ),
            });
        }

        Ok(())
    }

    /// Resolve the page size for a request, clamped to `1..=max_per_page`
    pub fn resolve_per_page(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.per_page)
            .clamp(1, self.max_per_page.max(1))
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: var.to_string(),
            value: raw,
            expected: "a non-negative integer".to_string(),
        }),
        Err(_) => Ok(default),
    }
}

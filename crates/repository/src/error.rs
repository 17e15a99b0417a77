//! Error types for repository operations
//!
//! Repositories only translate "no row" into [`RepositoryError::NotFound`];
//! every other failure is the backend's own signal passed through untouched.

use crate::config::ConfigError;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error types for repository operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// No row matched an id or a set of criteria
    #[error("{}", not_found_message(.table, .key))]
    NotFound { table: String, key: Option<String> },

    /// The executing engine rejected a read or a write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A row could not be decoded into the model, or the model into attributes
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backend cannot express the query it was handed
    #[error("Query error: {0}")]
    Query(String),

    /// Eager loading referenced a relationship the model does not declare
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// Invalid repository or pool configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

fn not_found_message(table: &str, key: &Option<String>) -> String {
    match key {
        Some(key) => format!("No record found in table '{}' for key {}", table, key),
        None => format!("No record found in table '{}' matching the given criteria", table),
    }
}

impl RepositoryError {
    /// Build a `NotFound` error for a table, optionally naming the key that was looked up
    pub fn not_found(table: impl Into<String>, key: Option<String>) -> Self {
        RepositoryError::NotFound {
            table: table.into(),
            key,
        }
    }

    /// Check whether this error signals a missing row
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

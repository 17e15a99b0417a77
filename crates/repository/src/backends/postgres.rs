//! PostgreSQL backend over an sqlx connection pool
//!
//! Rows are folded into JSONB by the generated SQL (`to_jsonb(table)`), so any
//! table shape decodes into [`Attributes`] without per-column type mapping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Pool, Postgres, Row};

use super::Connection;
use crate::config::PoolConfig;
use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{into_attributes, Attributes};
use crate::query::dml::WriteStatement;
use crate::query::{QueryBuilder, Selection};

/// Backend executing queries against PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresConnection {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresConnection {
    /// Wrap an existing pool
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }

    /// Create a pool from configuration and wrap it
    pub async fn connect(config: &PoolConfig) -> RepositoryResult<Self> {
        let database_url = config.require_url()?;

        tracing::debug!(
            "Creating database pool with config: max={}, min={}, timeout={}s, idle_timeout={:?}s, max_lifetime={:?}s, test_before_acquire={}",
            config.max_connections,
            config.min_connections,
            config.acquire_timeout,
            config.idle_timeout,
            config.max_lifetime,
            config.test_before_acquire
        );

        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .test_before_acquire(config.test_before_acquire);

        if let Some(idle_timeout) = config.idle_timeout {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }

        if let Some(max_lifetime) = config.max_lifetime {
            options = options.max_lifetime(Duration::from_secs(max_lifetime));
        }

        let pool = options.connect(database_url).await.map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            RepositoryError::Persistence(format!("Failed to create database pool: {}", e))
        })?;

        tracing::info!(
            "Database pool created with {} max connections",
            config.max_connections
        );
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// PostgreSQL type a JSON string is bound as
#[derive(Debug, PartialEq)]
enum TextBinding {
    Uuid(uuid::Uuid),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Text,
}

/// Strings that parse as UUIDs or RFC 3339 timestamps bind as `uuid` and
/// `timestamptz`. Such text compared against a `text` column therefore fails
/// with `operator does not exist: text = uuid`.
fn classify_text(s: &str) -> TextBinding {
    if let Ok(uuid) = uuid::Uuid::parse_str(s) {
        TextBinding::Uuid(uuid)
    } else if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(s) {
        TextBinding::Timestamp(timestamp.with_timezone(&chrono::Utc))
    } else {
        TextBinding::Text
    }
}

/// Bind a JSON value with the closest PostgreSQL type
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => match classify_text(s) {
            TextBinding::Uuid(uuid) => query.bind(uuid),
            TextBinding::Timestamp(timestamp) => query.bind(timestamp),
            TextBinding::Text => query.bind(s.clone()),
        },
        Value::Array(_) | Value::Object(_) => query.bind(sqlx::types::Json(value.clone())),
    }
}

fn prepare<'q>(sql: &'q str, params: &[Value]) -> Query<'q, Postgres, PgArguments> {
    tracing::debug!("Executing SQL: {} ({} params)", sql, params.len());
    params.iter().fold(sqlx::query(sql), bind_value)
}

fn decode_row(row: &PgRow) -> RepositoryResult<Attributes> {
    let value: Value = row.try_get("row")?;
    into_attributes(value)
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn count(&self, query: &QueryBuilder) -> RepositoryResult<u64> {
        let (sql, params) = query.to_sql_with_params(Selection::Count);
        let row = prepare(&sql, &params).fetch_one(self.pool()).await?;
        let count: i64 = row.try_get("aggregate")?;
        Ok(count.max(0) as u64)
    }

    async fn fetch(&self, query: &QueryBuilder) -> RepositoryResult<Vec<Attributes>> {
        let (sql, params) = query.to_sql_with_params(Selection::JsonRows);
        let rows = prepare(&sql, &params).fetch_all(self.pool()).await?;
        tracing::trace!("Fetched {} rows from '{}'", rows.len(), query.table_name());
        rows.iter().map(decode_row).collect()
    }

    async fn insert(
        &self,
        table: &str,
        _primary_key: &str,
        attributes: Attributes,
    ) -> RepositoryResult<Attributes> {
        let (sql, params) = WriteStatement::insert_into(table)
            .set_values(&attributes)
            .to_sql_with_params();
        let row = prepare(&sql, &params).fetch_one(self.pool()).await?;
        decode_row(&row)
    }

    async fn update(
        &self,
        table: &str,
        primary_key: &str,
        key: &Value,
        attributes: Attributes,
    ) -> RepositoryResult<Option<Attributes>> {
        if attributes.is_empty() {
            return Err(RepositoryError::Query(format!(
                "update of '{}' requires at least one attribute",
                table
            )));
        }

        let (sql, params) = WriteStatement::update(table)
            .set_values(&attributes)
            .where_key(primary_key, key.clone())
            .to_sql_with_params();
        let row = prepare(&sql, &params).fetch_optional(self.pool()).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn delete(&self, table: &str, primary_key: &str, key: &Value) -> RepositoryResult<u64> {
        let (sql, params) = WriteStatement::delete_from(table)
            .where_key(primary_key, key.clone())
            .to_sql_with_params();
        let result = prepare(&sql, &params).execute(self.pool()).await?;
        Ok(result.rows_affected())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

//! Database Backends
//!
//! [`Connection`] is the execution seam repositories delegate to. Reads take
//! a [`QueryBuilder`]; writes address a single row by primary key. Rows cross
//! the seam as [`Attributes`] so one trait serves every model.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RepositoryResult;
use crate::model::Attributes;
use crate::query::QueryBuilder;

pub mod memory;
pub mod postgres;

pub use memory::{Column, MemoryConnection, TableSchema};
pub use postgres::PostgresConnection;

/// Abstract execution backend for repositories
#[async_trait]
pub trait Connection: Send + Sync {
    /// Count rows matching the query's conditions, ignoring order, limit and offset
    async fn count(&self, query: &QueryBuilder) -> RepositoryResult<u64>;

    /// Fetch rows matching the query
    async fn fetch(&self, query: &QueryBuilder) -> RepositoryResult<Vec<Attributes>>;

    /// Insert a row and return it as stored, generated columns included
    async fn insert(
        &self,
        table: &str,
        primary_key: &str,
        attributes: Attributes,
    ) -> RepositoryResult<Attributes>;

    /// Update the row keyed by `key`, returning it as stored, or `None` if no such row exists
    async fn update(
        &self,
        table: &str,
        primary_key: &str,
        key: &Value,
        attributes: Attributes,
    ) -> RepositoryResult<Option<Attributes>>;

    /// Delete the row keyed by `key`, returning the number of rows removed
    async fn delete(&self, table: &str, primary_key: &str, key: &Value) -> RepositoryResult<u64>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

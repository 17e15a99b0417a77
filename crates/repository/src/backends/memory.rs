//! In-memory backend
//!
//! Tables live behind a `tokio::sync::RwLock` and are declared up front with
//! a [`TableSchema`], so unknown tables, unknown columns, missing NOT NULL
//! values and duplicate primary keys fail the way they would in PostgreSQL.
//! Rows are returned in insertion order unless the query orders them.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::Connection;
use crate::error::{RepositoryError, RepositoryResult};
use crate::model::Attributes;
use crate::query::evaluation::column_name;
use crate::query::{compare_values, OrderDirection, QueryBuilder};

/// Column definition for an in-memory table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl Column {
    /// Create a NOT NULL column without a default
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nullable: false,
            default: None,
        }
    }

    /// Allow NULL values
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when an insert omits this column
    pub fn default_value<T: Into<Value>>(mut self, value: T) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Table definition for the in-memory backend
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub primary_key: String,
    pub increments: bool,
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Start a table with an auto-incrementing integer `id` primary key
    pub fn create(name: &str) -> Self {
        Self {
            name: name.to_string(),
            primary_key: "id".to_string(),
            increments: true,
            columns: vec![Column::new("id")],
        }
    }

    /// Replace the primary key with a caller-supplied (non-incrementing) key column
    pub fn keyed_by(mut self, column: &str) -> Self {
        self.columns.retain(|c| c.name != self.primary_key);
        self.primary_key = column.to_string();
        self.increments = false;
        self.columns.insert(0, Column::new(column));
        self
    }

    /// Add a column definition
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a NOT NULL column
    pub fn required(self, name: &str) -> Self {
        self.column(Column::new(name))
    }

    /// Add a nullable column
    pub fn nullable(self, name: &str) -> Self {
        self.column(Column::new(name).nullable())
    }

    /// Add nullable `created_at` and `updated_at` columns
    pub fn timestamps(self) -> Self {
        self.nullable("created_at").nullable("updated_at")
    }

    fn find_column(&self, name: &str) -> Option<&Column> {
        let name = column_name(name);
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug)]
struct MemoryTable {
    schema: TableSchema,
    rows: Vec<Attributes>,
    next_id: i64,
}

impl MemoryTable {
    fn check_column(&self, column: &str) -> RepositoryResult<()> {
        match self.schema.find_column(column) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::Persistence(format!(
                "column \"{}\" of relation \"{}\" does not exist",
                column, self.schema.name
            ))),
        }
    }

    fn position_of(&self, key: &Value) -> Option<usize> {
        let primary_key = &self.schema.primary_key;
        self.rows.iter().position(|row| {
            row.get(primary_key)
                .map(|value| compare_values(value, key) == Some(Ordering::Equal))
                .unwrap_or(false)
        })
    }

    fn check_not_null(&self, row: &Attributes) -> RepositoryResult<()> {
        for column in &self.schema.columns {
            let is_null = row.get(&column.name).map(Value::is_null).unwrap_or(true);
            if is_null && !column.nullable {
                return Err(RepositoryError::Persistence(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    column.name, self.schema.name
                )));
            }
        }
        Ok(())
    }

    fn duplicate_key(&self) -> RepositoryError {
        RepositoryError::Persistence(format!(
            "duplicate key value violates unique constraint \"{}_pkey\"",
            self.schema.name
        ))
    }

    fn select(&self, query: &QueryBuilder) -> RepositoryResult<Vec<&Attributes>> {
        let mut selected = Vec::new();
        for row in &self.rows {
            let lookup = |column: &str| -> RepositoryResult<Value> {
                self.check_column(column)?;
                Ok(row.get(column_name(column)).cloned().unwrap_or(Value::Null))
            };
            if query.wheres().matches_with(&lookup)? {
                selected.push(row);
            }
        }
        Ok(selected)
    }
}

/// Backend keeping every table in process memory
#[derive(Debug, Default)]
pub struct MemoryConnection {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryConnection {
    /// Create a backend with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a table
    pub async fn create_table(&self, schema: TableSchema) {
        tracing::debug!("Creating in-memory table '{}'", schema.name);
        let mut tables = self.tables.write().await;
        tables.insert(
            schema.name.clone(),
            MemoryTable {
                schema,
                rows: Vec::new(),
                next_id: 1,
            },
        );
    }

    /// Drop a table if it exists
    pub async fn drop_table(&self, name: &str) {
        self.tables.write().await.remove(name);
    }

    /// Snapshot of a table's rows in insertion order
    pub async fn rows(&self, table: &str) -> RepositoryResult<Vec<Attributes>> {
        let tables = self.tables.read().await;
        Ok(table_ref(&tables, table)?.rows.clone())
    }
}

fn table_ref<'a>(
    tables: &'a HashMap<String, MemoryTable>,
    name: &str,
) -> RepositoryResult<&'a MemoryTable> {
    tables.get(name).ok_or_else(|| missing_table(name))
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, MemoryTable>,
    name: &str,
) -> RepositoryResult<&'a mut MemoryTable> {
    tables.get_mut(name).ok_or_else(|| missing_table(name))
}

fn missing_table(name: &str) -> RepositoryError {
    RepositoryError::Persistence(format!("relation \"{}\" does not exist", name))
}

/// NULLs sort last ascending and first descending, as in PostgreSQL
fn order_rows(rows: &mut [&Attributes], orders: &[(String, OrderDirection)]) {
    rows.sort_by(|a, b| {
        for (column, direction) in orders {
            let column = column_name(column);
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
            };
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn count(&self, query: &QueryBuilder) -> RepositoryResult<u64> {
        let tables = self.tables.read().await;
        let table = table_ref(&tables, query.table_name())?;
        let count = table.select(query)?.len() as u64;
        tracing::trace!("Counted {} rows in '{}'", count, query.table_name());
        Ok(count)
    }

    async fn fetch(&self, query: &QueryBuilder) -> RepositoryResult<Vec<Attributes>> {
        let tables = self.tables.read().await;
        let table = table_ref(&tables, query.table_name())?;

        for (column, _) in query.orders() {
            table.check_column(column)?;
        }

        let mut rows = table.select(query)?;
        order_rows(&mut rows, query.orders());

        let offset = query.offset_count().unwrap_or(0) as usize;
        let limit = query.limit_value().map(|l| l as usize).unwrap_or(usize::MAX);
        let rows: Vec<Attributes> = rows.into_iter().skip(offset).take(limit).cloned().collect();

        tracing::trace!("Fetched {} rows from '{}'", rows.len(), query.table_name());
        Ok(rows)
    }

    async fn insert(
        &self,
        table: &str,
        primary_key: &str,
        attributes: Attributes,
    ) -> RepositoryResult<Attributes> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table)?;

        for column in attributes.keys() {
            table.check_column(column)?;
        }

        let mut row = Attributes::new();
        for column in &table.schema.columns {
            let value = attributes
                .get(&column.name)
                .cloned()
                .or_else(|| column.default.clone())
                .unwrap_or(Value::Null);
            row.insert(column.name.clone(), value);
        }

        let key = row.get(primary_key).cloned().unwrap_or(Value::Null);
        if key.is_null() {
            if table.schema.increments {
                let id = Value::from(table.next_id);
                // the sequence stops at i64::MAX once a row holds that key
                if table.position_of(&id).is_some() {
                    return Err(RepositoryError::Persistence(format!(
                        "nextval: reached maximum value of sequence \"{}_{}_seq\" ({})",
                        table.schema.name,
                        primary_key,
                        i64::MAX
                    )));
                }
                row.insert(primary_key.to_string(), id);
                table.next_id = table.next_id.saturating_add(1);
            }
        } else {
            if table.position_of(&key).is_some() {
                return Err(table.duplicate_key());
            }
            if let Some(id) = key.as_i64() {
                table.next_id = table.next_id.max(id.saturating_add(1));
            }
        }

        table.check_not_null(&row)?;
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        primary_key: &str,
        key: &Value,
        attributes: Attributes,
    ) -> RepositoryResult<Option<Attributes>> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table)?;

        for column in attributes.keys() {
            table.check_column(column)?;
        }

        let Some(index) = table.position_of(key) else {
            return Ok(None);
        };

        if let Some(new_key) = attributes.get(primary_key) {
            let taken = table.position_of(new_key).map(|i| i != index).unwrap_or(false);
            if taken {
                return Err(table.duplicate_key());
            }
        }

        let mut row = table.rows[index].clone();
        for (column, value) in attributes {
            row.insert(column, value);
        }
        table.check_not_null(&row)?;
        table.rows[index] = row.clone();

        Ok(Some(row))
    }

    async fn delete(&self, table: &str, _primary_key: &str, key: &Value) -> RepositoryResult<u64> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table)?;

        match table.position_of(key) {
            Some(index) => {
                table.rows.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

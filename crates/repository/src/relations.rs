//! Relationship declarations and eager loading
//!
//! Eager loading issues one `IN` query per requested relationship for the
//! whole parent result set, then attaches the related rows under the
//! relationship name before the parents are decoded.

use std::collections::HashMap;

use serde_json::Value;

use crate::backends::Connection;
use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{Attributes, Model};
use crate::query::evaluation::column_name;
use crate::query::QueryBuilder;

/// Relationship a model declares towards another table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Parent row holds `foreign_key` pointing at `owner_key` of the related table
    BelongsTo {
        name: String,
        related_table: String,
        foreign_key: String,
        owner_key: String,
    },
    /// Related table holds `foreign_key` pointing at `local_key` of the parent; at most one row
    HasOne {
        name: String,
        related_table: String,
        foreign_key: String,
        local_key: String,
    },
    /// Related table holds `foreign_key` pointing at `local_key` of the parent
    HasMany {
        name: String,
        related_table: String,
        foreign_key: String,
        local_key: String,
    },
}

impl Relation {
    /// `belongs_to` with the related table keyed by `id`
    pub fn belongs_to(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Relation::BelongsTo {
            name: name.to_string(),
            related_table: related_table.to_string(),
            foreign_key: foreign_key.to_string(),
            owner_key: "id".to_string(),
        }
    }

    /// `has_one` matched against the parent's `id`
    pub fn has_one(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Relation::HasOne {
            name: name.to_string(),
            related_table: related_table.to_string(),
            foreign_key: foreign_key.to_string(),
            local_key: "id".to_string(),
        }
    }

    /// `has_many` matched against the parent's `id`
    pub fn has_many(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Relation::HasMany {
            name: name.to_string(),
            related_table: related_table.to_string(),
            foreign_key: foreign_key.to_string(),
            local_key: "id".to_string(),
        }
    }

    /// Override the key on the non-foreign side (`owner_key` or `local_key`)
    pub fn keyed_by(mut self, key: &str) -> Self {
        match &mut self {
            Relation::BelongsTo { owner_key, .. } => *owner_key = key.to_string(),
            Relation::HasOne { local_key, .. } | Relation::HasMany { local_key, .. } => {
                *local_key = key.to_string()
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Relation::BelongsTo { name, .. }
            | Relation::HasOne { name, .. }
            | Relation::HasMany { name, .. } => name,
        }
    }

    pub fn related_table(&self) -> &str {
        match self {
            Relation::BelongsTo { related_table, .. }
            | Relation::HasOne { related_table, .. }
            | Relation::HasMany { related_table, .. } => related_table,
        }
    }

    /// (column read from the parent, column matched on the related table)
    fn key_pair(&self) -> (&str, &str) {
        match self {
            Relation::BelongsTo {
                foreign_key,
                owner_key,
                ..
            } => (foreign_key.as_str(), owner_key.as_str()),
            Relation::HasOne {
                foreign_key,
                local_key,
                ..
            }
            | Relation::HasMany {
                foreign_key,
                local_key,
                ..
            } => (local_key.as_str(), foreign_key.as_str()),
        }
    }
}

/// Load `names` for every row in `rows`, attaching results in place
pub async fn eager_load<M: Model>(
    connection: &dyn Connection,
    rows: &mut [Attributes],
    names: &[String],
) -> RepositoryResult<()> {
    if rows.is_empty() {
        return Ok(());
    }

    for name in names {
        let relation = M::relationship(name).ok_or_else(|| {
            RepositoryError::Relationship(format!(
                "Call to undefined relationship [{}] on model [{}]",
                name,
                M::table_name()
            ))
        })?;
        load_relation(connection, rows, &relation).await?;
    }

    Ok(())
}

async fn load_relation(
    connection: &dyn Connection,
    rows: &mut [Attributes],
    relation: &Relation,
) -> RepositoryResult<()> {
    let (parent_column, related_column) = relation.key_pair();
    let parent_column = column_name(parent_column);

    let mut keys: Vec<Value> = Vec::new();
    for row in rows.iter() {
        if let Some(value) = row.get(parent_column).filter(|v| !v.is_null()) {
            if !keys.contains(value) {
                keys.push(value.clone());
            }
        }
    }

    let related = if keys.is_empty() {
        Vec::new()
    } else {
        let query = QueryBuilder::table(relation.related_table())
            .filter(|q| q.where_in(related_column, keys));
        connection.fetch(&query).await?
    };

    tracing::debug!(
        "Eager loaded {} '{}' rows for {} parents",
        related.len(),
        relation.name(),
        rows.len()
    );

    let mut by_key: HashMap<String, Vec<&Attributes>> = HashMap::new();
    for related_row in &related {
        if let Some(key) = related_row.get(column_name(related_column)).and_then(match_key) {
            by_key.entry(key).or_default().push(related_row);
        }
    }

    for row in rows.iter_mut() {
        let matches = row
            .get(parent_column)
            .and_then(match_key)
            .and_then(|key| by_key.get(&key));

        let value = match relation {
            Relation::HasMany { .. } => Value::Array(
                matches
                    .map(|found| found.iter().map(|r| Value::Object((*r).clone())).collect())
                    .unwrap_or_default(),
            ),
            Relation::BelongsTo { .. } | Relation::HasOne { .. } => matches
                .and_then(|found| found.first())
                .map(|r| Value::Object((*r).clone()))
                .unwrap_or(Value::Null),
        };

        row.insert(relation.name().to_string(), value);
    }

    Ok(())
}

/// Normalised lookup key so `1`, `1.0` and `"1"` pair up like they would in SQL
fn match_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64()?.to_string(),
        }),
        Value::String(s) => Some(match s.trim().parse::<i64>() {
            Ok(i) => i.to_string(),
            Err(_) => s.clone(),
        }),
        other => Some(other.to_string()),
    }
}

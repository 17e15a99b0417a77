//! Write statements (INSERT, UPDATE, DELETE) addressed by primary key

use serde_json::Value;

use super::sql_generation::quote_identifier;
use crate::model::Attributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Insert,
    Update,
    Delete,
}

/// Set clause for UPDATE and INSERT operations
#[derive(Debug, Clone)]
pub struct SetClause {
    pub column: String,
    pub value: Value,
}

/// Single-table write statement
#[derive(Debug, Clone)]
pub struct WriteStatement {
    kind: StatementKind,
    table: String,
    set_clauses: Vec<SetClause>,
    key: Option<(String, Value)>,
}

impl WriteStatement {
    fn new(kind: StatementKind, table: &str) -> Self {
        Self {
            kind,
            table: table.to_string(),
            set_clauses: Vec::new(),
            key: None,
        }
    }

    /// Start an INSERT statement
    pub fn insert_into(table: &str) -> Self {
        Self::new(StatementKind::Insert, table)
    }

    /// Start an UPDATE statement
    pub fn update(table: &str) -> Self {
        Self::new(StatementKind::Update, table)
    }

    /// Start a DELETE statement
    pub fn delete_from(table: &str) -> Self {
        Self::new(StatementKind::Delete, table)
    }

    /// Set a column value (for INSERT/UPDATE)
    pub fn set<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set every attribute in map order
    pub fn set_values(mut self, values: &Attributes) -> Self {
        for (column, value) in values {
            self.set_clauses.push(SetClause {
                column: column.clone(),
                value: value.clone(),
            });
        }
        self
    }

    /// Restrict UPDATE/DELETE to the row whose `column` equals `value`
    pub fn where_key<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.key = Some((column.to_string(), value.into()));
        self
    }

    /// Generate SQL with `$n` placeholders; NULL values are inlined as `NULL`
    ///
    /// INSERT and UPDATE return the written row as a single JSONB column named `row`.
    pub fn to_sql_with_params(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        let table = quote_identifier(&self.table);

        match self.kind {
            StatementKind::Insert => {
                if self.set_clauses.is_empty() {
                    sql.push_str(&format!("INSERT INTO {} DEFAULT VALUES", table));
                } else {
                    let columns: Vec<String> = self
                        .set_clauses
                        .iter()
                        .map(|clause| quote_identifier(&clause.column))
                        .collect();
                    let values: Vec<String> = self
                        .set_clauses
                        .iter()
                        .map(|clause| placeholder(&clause.value, &mut params))
                        .collect();
                    sql.push_str(&format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        table,
                        columns.join(", "),
                        values.join(", ")
                    ));
                }
            }
            StatementKind::Update => {
                let assignments: Vec<String> = self
                    .set_clauses
                    .iter()
                    .map(|clause| {
                        format!(
                            "{} = {}",
                            quote_identifier(&clause.column),
                            placeholder(&clause.value, &mut params)
                        )
                    })
                    .collect();
                sql.push_str(&format!("UPDATE {} SET {}", table, assignments.join(", ")));
            }
            StatementKind::Delete => {
                sql.push_str(&format!("DELETE FROM {}", table));
            }
        }

        if self.kind != StatementKind::Insert {
            if let Some((column, value)) = &self.key {
                params.push(value.clone());
                sql.push_str(&format!(" WHERE {} = ${}", quote_identifier(column), params.len()));
            }
        }

        if self.kind != StatementKind::Delete {
            let row_ref = self.table.rsplit('.').next().unwrap_or(&self.table);
            sql.push_str(&format!(" RETURNING to_jsonb({}) AS \"row\"", quote_identifier(row_ref)));
        }

        (sql, params)
    }
}

fn placeholder(value: &Value, params: &mut Vec<Value>) -> String {
    if value.is_null() {
        "NULL".to_string()
    } else {
        params.push(value.clone());
        format!("${}", params.len())
    }
}

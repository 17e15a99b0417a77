//! Query Builder SQL generation
//!
//! PostgreSQL dialect with `$n` placeholders. Values never reach the SQL text;
//! they are returned alongside it in binding order.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use super::where_clause::WhereGroup;

/// Quote an identifier, quoting each segment of a dotted name separately
///
/// `*` segments are left bare so `users.*` stays a valid projection.
pub fn quote_identifier(identifier: &str) -> String {
    identifier
        .split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                format!("\"{}\"", segment.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl QueryBuilder {
    /// Generate SQL from query with parameter placeholders and return parameters
    pub fn to_sql_with_params(&self, selection: Selection) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        match selection {
            Selection::Columns => sql.push_str("SELECT *"),
            Selection::JsonRows => {
                let row_ref = self.table.rsplit('.').next().unwrap_or(&self.table);
                sql.push_str(&format!("SELECT to_jsonb({}) AS \"row\"", quote_identifier(row_ref)));
            }
            Selection::Count => sql.push_str("SELECT COUNT(*) AS \"aggregate\""),
        }

        sql.push_str(" FROM ");
        sql.push_str(&quote_identifier(&self.table));

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            compile_group(&self.wheres, &mut sql, &mut params);
        }

        if selection != Selection::Count {
            self.build_order_limit_clause(&mut sql);
        }

        (sql, params)
    }

    /// SQL text of the `SELECT *` form, for logging and inspection
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params(Selection::Columns).0
    }

    /// Helper method to build ORDER BY and LIMIT clauses
    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let orders: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", quote_identifier(column), direction))
                .collect();
            sql.push_str(&orders.join(", "));
        }

        // PostgreSQL takes LIMIT and OFFSET as bigint
        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit.min(i64::MAX as u64)));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset.min(i64::MAX as u64)));
        }
    }
}

/// Compile a where group (without the WHERE keyword) into `sql`, pushing bindings into `params`
pub(crate) fn compile_group(group: &WhereGroup, sql: &mut String, params: &mut Vec<Value>) {
    for (i, clause) in group.clauses.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(&clause.conjunction.to_string());
            sql.push(' ');
        }
        compile_condition(&clause.condition, sql, params);
    }
}

fn compile_condition(condition: &Condition, sql: &mut String, params: &mut Vec<Value>) {
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => {
            params.push(value.clone());
            sql.push_str(&format!(
                "{} {} ${}",
                quote_identifier(column),
                operator,
                params.len()
            ));
        }
        Condition::In {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // IN () is a syntax error; an empty set matches nothing, NOT IN matches everything
                sql.push_str(if *negated { "1 = 1" } else { "0 = 1" });
                return;
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|value| {
                    params.push(value.clone());
                    format!("${}", params.len())
                })
                .collect();
            sql.push_str(&format!(
                "{} {} ({})",
                quote_identifier(column),
                if *negated { "NOT IN" } else { "IN" },
                placeholders.join(", ")
            ));
        }
        Condition::Null { column, negated } => {
            sql.push_str(&format!(
                "{} {}",
                quote_identifier(column),
                if *negated { "IS NOT NULL" } else { "IS NULL" }
            ));
        }
        Condition::Between { column, low, high } => {
            params.push(low.clone());
            let low_index = params.len();
            params.push(high.clone());
            sql.push_str(&format!(
                "{} BETWEEN ${} AND ${}",
                quote_identifier(column),
                low_index,
                params.len()
            ));
        }
        Condition::Raw { sql: raw, bindings } => {
            let mut bindings = bindings.iter();
            for ch in raw.chars() {
                if ch == '?' {
                    if let Some(value) = bindings.next() {
                        params.push(value.clone());
                        sql.push_str(&format!("${}", params.len()));
                        continue;
                    }
                }
                sql.push(ch);
            }
        }
        Condition::Nested(group) => {
            sql.push('(');
            compile_group(group, sql, params);
            sql.push(')');
        }
    }
}

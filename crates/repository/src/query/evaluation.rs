//! In-memory evaluation of where groups against attribute maps
//!
//! Mirrors the SQL the same group compiles to: AND binds tighter than OR,
//! any comparison involving NULL is not a match, and raw SQL fragments are
//! rejected because they cannot be interpreted outside a database.

use std::cmp::Ordering;

use serde_json::Value;

use super::types::*;
use super::where_clause::WhereGroup;
use crate::error::{RepositoryError, RepositoryResult};
use crate::model::Attributes;

impl WhereGroup {
    /// Check whether a row satisfies every condition of this group
    ///
    /// `column` lookups resolve through `lookup`, which reports unknown
    /// columns as errors the same way a database would at execution time.
    pub fn matches_with<F>(&self, lookup: &F) -> RepositoryResult<bool>
    where
        F: Fn(&str) -> RepositoryResult<Value>,
    {
        // Split into OR-separated runs of AND-ed conditions
        let mut any_run = false;
        let mut run = true;

        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 && clause.conjunction == Conjunction::Or {
                any_run |= run;
                run = true;
            }
            if run {
                run = condition_matches(&clause.condition, lookup)?;
            } else if let Condition::Raw { .. } = clause.condition {
                // still reject raw SQL even when short-circuited
                condition_matches(&clause.condition, lookup)?;
            }
        }

        Ok(self.clauses.is_empty() || any_run || run)
    }

    /// Check a row given as attributes; missing columns read as NULL
    pub fn matches(&self, row: &Attributes) -> RepositoryResult<bool> {
        self.matches_with(&|column: &str| {
            Ok(row.get(column_name(column)).cloned().unwrap_or(Value::Null))
        })
    }
}

/// Strip a table qualifier from `table.column`
pub(crate) fn column_name(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

fn condition_matches<F>(condition: &Condition, lookup: &F) -> RepositoryResult<bool>
where
    F: Fn(&str) -> RepositoryResult<Value>,
{
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => {
            let actual = lookup(column)?;
            Ok(compare_matches(&actual, *operator, value))
        }
        Condition::In {
            column,
            values,
            negated,
        } => {
            let actual = lookup(column)?;
            if actual.is_null() {
                return Ok(false);
            }
            let found = values
                .iter()
                .any(|candidate| compare_values(&actual, candidate) == Some(Ordering::Equal));
            Ok(found != *negated)
        }
        Condition::Null { column, negated } => {
            let actual = lookup(column)?;
            Ok(actual.is_null() != *negated)
        }
        Condition::Between { column, low, high } => {
            let actual = lookup(column)?;
            let above = matches!(
                compare_values(&actual, low),
                Some(Ordering::Greater | Ordering::Equal)
            );
            let below = matches!(
                compare_values(&actual, high),
                Some(Ordering::Less | Ordering::Equal)
            );
            Ok(above && below)
        }
        Condition::Raw { sql, .. } => Err(RepositoryError::Query(format!(
            "raw SQL condition '{}' cannot be evaluated outside a database",
            sql
        ))),
        Condition::Nested(group) => group.matches_with(lookup),
    }
}

fn compare_matches(actual: &Value, operator: QueryOperator, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        return false;
    }

    match operator {
        QueryOperator::Like | QueryOperator::NotLike => {
            let (Some(text), Some(pattern)) = (as_text(actual), expected.as_str()) else {
                return false;
            };
            like(&text, pattern) == (operator == QueryOperator::Like)
        }
        _ => {
            let Some(ordering) = compare_values(actual, expected) else {
                return operator == QueryOperator::NotEqual;
            };
            match operator {
                QueryOperator::Equal => ordering == Ordering::Equal,
                QueryOperator::NotEqual => ordering != Ordering::Equal,
                QueryOperator::GreaterThan => ordering == Ordering::Greater,
                QueryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                QueryOperator::LessThan => ordering == Ordering::Less,
                QueryOperator::LessThanOrEqual => ordering != Ordering::Greater,
                QueryOperator::Like | QueryOperator::NotLike => unreachable!(),
            }
        }
    }
}

/// Order two JSON scalars the way a database would compare a column to a literal
///
/// Numbers compare numerically, numeric strings compare against numbers,
/// strings compare lexicographically. Anything else is incomparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Number(n), Value::String(s)) => n.as_f64()?.partial_cmp(&s.trim().parse::<f64>().ok()?),
        (Value::String(s), Value::Number(n)) => s.trim().parse::<f64>().ok()?.partial_cmp(&n.as_f64()?),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            (left == right).then_some(Ordering::Equal)
        }
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Case-sensitive SQL LIKE with `%` and `_` wildcards
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j] == text[..i] matches pattern[..j]
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }

    for &c in &text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                p => matched[j - 1] && p == c,
            };
        }
        matched = next;
    }

    matched[pattern.len()]
}

//! Query Builder WHERE clause operations
//!
//! A [`WhereGroup`] is an ordered list of conditions, each attached with AND
//! or OR. Raw criteria closures receive a fresh group, so everything a
//! caller can express here can also be expressed as a criterion.

use serde_json::Value;

use super::types::*;

/// Ordered, conjoined list of where conditions
#[derive(Debug, Clone, Default)]
pub struct WhereGroup {
    pub(crate) clauses: Vec<WhereClause>,
}

impl WhereGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Conditions in the order they were added
    pub fn clauses(&self) -> &[WhereClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    fn push(mut self, conjunction: Conjunction, condition: Condition) -> Self {
        self.clauses.push(WhereClause {
            conjunction,
            condition,
        });
        self
    }

    fn compare(self, conjunction: Conjunction, column: &str, operator: QueryOperator, value: Value) -> Self {
        // `= NULL` never matches in SQL; treat it as the null check it was meant to be
        match (operator, value) {
            (QueryOperator::Equal, Value::Null) => self.push(
                conjunction,
                Condition::Null {
                    column: column.to_string(),
                    negated: false,
                },
            ),
            (QueryOperator::NotEqual, Value::Null) => self.push(
                conjunction,
                Condition::Null {
                    column: column.to_string(),
                    negated: true,
                },
            ),
            (operator, value) => self.push(
                conjunction,
                Condition::Compare {
                    column: column.to_string(),
                    operator,
                    value,
                },
            ),
        }
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::Equal, value.into())
    }

    /// Add OR WHERE condition with equality
    pub fn or_where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::Or, column, QueryOperator::Equal, value.into())
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::NotEqual, value.into())
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::GreaterThan, value.into())
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::GreaterThanOrEqual, value.into())
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::LessThan, value.into())
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::LessThanOrEqual, value.into())
    }

    /// Add WHERE condition with LIKE
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::Like, Value::String(pattern.to_string()))
    }

    /// Add WHERE condition with NOT LIKE
    pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
        self.compare(Conjunction::And, column, QueryOperator::NotLike, Value::String(pattern.to_string()))
    }

    /// Add WHERE condition with any comparison operator
    ///
    /// Operators held as SQL text go through [`QueryOperator::parse`] first,
    /// so an unknown one is rejected by the caller instead of guessed at.
    pub fn where_op<T: Into<Value>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.compare(Conjunction::And, column, operator, value.into())
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.push(
            Conjunction::And,
            Condition::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                negated: false,
            },
        )
    }

    /// Add OR WHERE condition with IN
    pub fn or_where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.push(
            Conjunction::Or,
            Condition::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                negated: false,
            },
        )
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        self.push(
            Conjunction::And,
            Condition::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                negated: true,
            },
        )
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push(
            Conjunction::And,
            Condition::Null {
                column: column.to_string(),
                negated: false,
            },
        )
    }

    /// Add OR WHERE condition with IS NULL
    pub fn or_where_null(self, column: &str) -> Self {
        self.push(
            Conjunction::Or,
            Condition::Null {
                column: column.to_string(),
                negated: false,
            },
        )
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push(
            Conjunction::And,
            Condition::Null {
                column: column.to_string(),
                negated: true,
            },
        )
    }

    /// Add WHERE condition with BETWEEN
    pub fn where_between<T: Into<Value>>(self, column: &str, low: T, high: T) -> Self {
        self.push(
            Conjunction::And,
            Condition::Between {
                column: column.to_string(),
                low: low.into(),
                high: high.into(),
            },
        )
    }

    /// Add raw WHERE condition; `?` placeholders are bound in order
    pub fn where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push(
            Conjunction::And,
            Condition::Raw {
                sql: sql.to_string(),
                bindings,
            },
        )
    }

    /// Add a parenthesised AND group built by `build`
    pub fn where_nested<F>(self, build: F) -> Self
    where
        F: FnOnce(WhereGroup) -> WhereGroup,
    {
        self.nested(Conjunction::And, build)
    }

    /// Add a parenthesised OR group built by `build`
    pub fn or_where_nested<F>(self, build: F) -> Self
    where
        F: FnOnce(WhereGroup) -> WhereGroup,
    {
        self.nested(Conjunction::Or, build)
    }

    fn nested<F>(self, conjunction: Conjunction, build: F) -> Self
    where
        F: FnOnce(WhereGroup) -> WhereGroup,
    {
        let group = build(WhereGroup::new());
        // An empty group adds nothing, as `()` would be invalid SQL
        if group.is_empty() {
            return self;
        }
        self.push(conjunction, Condition::Nested(group))
    }
}

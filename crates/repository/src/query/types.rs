//! Query Builder Types - Core types and enums for query building

use std::fmt;
use serde_json::Value;

/// Comparison operators for binary where conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

impl QueryOperator {
    /// Parse an operator as written in SQL
    pub fn parse(operator: &str) -> Option<Self> {
        match operator.trim().to_uppercase().as_str() {
            "=" => Some(QueryOperator::Equal),
            "!=" | "<>" => Some(QueryOperator::NotEqual),
            ">" => Some(QueryOperator::GreaterThan),
            ">=" => Some(QueryOperator::GreaterThanOrEqual),
            "<" => Some(QueryOperator::LessThan),
            "<=" => Some(QueryOperator::LessThanOrEqual),
            "LIKE" => Some(QueryOperator::Like),
            "NOT LIKE" => Some(QueryOperator::NotLike),
            _ => None,
        }
    }
}

/// How a condition joins the conditions before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => write!(f, "AND"),
            Conjunction::Or => write!(f, "OR"),
        }
    }
}

/// A single predicate inside a where group
#[derive(Debug, Clone)]
pub enum Condition {
    /// `column <op> value`
    Compare {
        column: String,
        operator: QueryOperator,
        value: Value,
    },
    /// `column IN (...)` or `column NOT IN (...)`
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column IS NULL` or `column IS NOT NULL`
    Null { column: String, negated: bool },
    /// `column BETWEEN low AND high`
    Between {
        column: String,
        low: Value,
        high: Value,
    },
    /// Raw SQL fragment with `?` placeholders
    Raw { sql: String, bindings: Vec<Value> },
    /// Parenthesised sub-group
    Nested(super::where_clause::WhereGroup),
}

/// A condition together with the conjunction that attaches it
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub conjunction: Conjunction,
    pub condition: Condition,
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// What a SELECT statement projects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// `SELECT *`
    Columns,
    /// Each row folded into a single JSONB column named `row`
    JsonRows,
    /// `SELECT COUNT(*) AS aggregate`, ignoring order, limit and offset
    Count,
}

//! Query Builder - Core builder implementation

use super::types::*;
use super::where_clause::WhereGroup;

/// Not-yet-executed SELECT over a single table
///
/// Built fluently and handed to a [`Connection`](crate::backends::Connection)
/// for execution; building never touches the database.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) table: String,
    pub(crate) wheres: WhereGroup,
    pub(crate) eager: Vec<String>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<u64>,
    pub(crate) offset_value: Option<u64>,
}

impl QueryBuilder {
    /// Create a new query over `table`
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            wheres: WhereGroup::new(),
            eager: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn wheres(&self) -> &WhereGroup {
        &self.wheres
    }

    /// Relationship names requested for eager loading
    pub fn eager_loads(&self) -> &[String] {
        &self.eager
    }

    pub fn orders(&self) -> &[(String, OrderDirection)] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit_count
    }

    pub fn offset_count(&self) -> Option<u64> {
        self.offset_value
    }

    /// Extend the root where group
    pub fn filter<F>(mut self, build: F) -> Self
    where
        F: FnOnce(WhereGroup) -> WhereGroup,
    {
        self.wheres = build(self.wheres);
        self
    }

    /// Shorthand for `filter(|q| q.where_eq(column, value))`
    pub fn where_eq<T: Into<serde_json::Value>>(self, column: &str, value: T) -> Self {
        self.filter(|q| q.where_eq(column, value))
    }

    /// Request eager loading of relationships, skipping names already requested
    pub fn with<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for relation in relations {
            let relation = relation.into();
            if !self.eager.contains(&relation) {
                self.eager.push(relation);
            }
        }
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    /// Add LIMIT clause
    pub fn limit(mut self, count: u64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, count: u64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// Add pagination (LIMIT + OFFSET); pages start at 1
    pub fn for_page(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.limit(per_page).offset((page - 1).saturating_mul(per_page))
    }
}

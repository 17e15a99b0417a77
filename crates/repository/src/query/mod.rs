//! Query Builder Module - Fluent, not-yet-executed queries over a single table

pub mod builder;
pub mod dml;
pub mod evaluation;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use evaluation::compare_values;
pub use sql_generation::quote_identifier;
pub use types::{Condition, Conjunction, OrderDirection, QueryOperator, Selection, WhereClause};
pub use where_clause::WhereGroup;

//! # elif-repository: Criteria-driven repositories for elif.rs
//!
//! A [`Repository`] turns an ordered criteria map into queries against a
//! model's table and provides count, find, list, paginate, store, update and
//! delete on top. Execution is delegated to a [`Connection`]: PostgreSQL via
//! sqlx, or an in-memory backend for tests.
//!
//! ```ignore
//! let users = Repository::<User>::new(connection)
//!     .with_criteria(Criteria::new().is_null("deleted_at"))
//!     .with_relationships(["team"]);
//!
//! let admins = users.get_where("role", "admin").await?;
//! let page = users.paginate(Criteria::new().is_in("id", vec![1, 3]), Some(2)).await?;
//! ```

pub mod backends;
pub mod config;
pub mod contract;
pub mod criteria;
pub mod error;
pub mod key;
pub mod model;
pub mod pagination;
pub mod query;
pub mod relations;
pub mod repository;

// Re-export core traits and types
pub use backends::{Column, Connection, MemoryConnection, PostgresConnection, TableSchema};
pub use config::{ConfigError, PoolConfig, RepositoryConfig};
pub use contract::RepositoryContract;
pub use criteria::{apply_criteria, Criteria, Criterion, RawPredicate};
pub use error::{RepositoryError, RepositoryResult};
pub use key::Key;
pub use model::{Attributes, Model};
pub use pagination::Paginator;
pub use query::{OrderDirection, QueryBuilder, WhereGroup};
pub use relations::Relation;
pub use repository::Repository;

pub mod prelude {
    pub use crate::backends::{Connection, MemoryConnection, TableSchema};
    pub use crate::contract::RepositoryContract;
    pub use crate::criteria::{Criteria, Criterion};
    pub use crate::error::{RepositoryError, RepositoryResult};
    pub use crate::key::Key;
    pub use crate::model::Model;
    pub use crate::pagination::Paginator;
    pub use crate::relations::Relation;
    pub use crate::repository::Repository;
}

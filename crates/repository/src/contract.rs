//! Repository contract
//!
//! Services depend on [`RepositoryContract`] so they can be handed a fake in
//! tests instead of a [`Repository`] bound to a database.

use async_trait::async_trait;
use serde_json::Value;

use crate::criteria::{Criteria, Criterion};
use crate::error::RepositoryResult;
use crate::key::Key;
use crate::model::Model;
use crate::pagination::Paginator;
use crate::repository::Repository;

#[async_trait]
pub trait RepositoryContract<M: Model>: Send + Sync {
    async fn count(&self, criteria: Criteria) -> RepositoryResult<u64>;

    async fn all(&self) -> RepositoryResult<Vec<M>>;

    async fn paginate(&self, criteria: Criteria, per_page: Option<u64>)
        -> RepositoryResult<Paginator<M>>;

    async fn find(&self, id: Key) -> RepositoryResult<M>;

    async fn find_by(&self, field: &str, value: Criterion) -> RepositoryResult<M>;

    async fn find_by_many(&self, criteria: Criteria) -> RepositoryResult<M>;

    async fn get_where(&self, field: &str, value: Criterion) -> RepositoryResult<Vec<M>>;

    async fn get_where_many(&self, criteria: Criteria) -> RepositoryResult<Vec<M>>;

    async fn store(&self, data: Value) -> RepositoryResult<M>;

    async fn update(&self, id: Key, data: Value) -> RepositoryResult<M>;

    async fn delete(&self, id: Key) -> RepositoryResult<bool>;

    fn with_criteria(&self, criteria: Criteria) -> Self
    where
        Self: Sized;

    fn with_relationships(&self, relationships: Vec<String>) -> Self
    where
        Self: Sized;
}

#[async_trait]
impl<M: Model> RepositoryContract<M> for Repository<M> {
    async fn count(&self, criteria: Criteria) -> RepositoryResult<u64> {
        Repository::count(self, criteria).await
    }

    async fn all(&self) -> RepositoryResult<Vec<M>> {
        Repository::all(self).await
    }

    async fn paginate(
        &self,
        criteria: Criteria,
        per_page: Option<u64>,
    ) -> RepositoryResult<Paginator<M>> {
        Repository::paginate(self, criteria, per_page).await
    }

    async fn find(&self, id: Key) -> RepositoryResult<M> {
        Repository::find(self, id).await
    }

    async fn find_by(&self, field: &str, value: Criterion) -> RepositoryResult<M> {
        Repository::find_by(self, field, value).await
    }

    async fn find_by_many(&self, criteria: Criteria) -> RepositoryResult<M> {
        Repository::find_by_many(self, criteria).await
    }

    async fn get_where(&self, field: &str, value: Criterion) -> RepositoryResult<Vec<M>> {
        Repository::get_where(self, field, value).await
    }

    async fn get_where_many(&self, criteria: Criteria) -> RepositoryResult<Vec<M>> {
        Repository::get_where_many(self, criteria).await
    }

    async fn store(&self, data: Value) -> RepositoryResult<M> {
        Repository::store(self, data).await
    }

    async fn update(&self, id: Key, data: Value) -> RepositoryResult<M> {
        Repository::update(self, id, data).await
    }

    async fn delete(&self, id: Key) -> RepositoryResult<bool> {
        Repository::delete(self, id).await
    }

    fn with_criteria(&self, criteria: Criteria) -> Self {
        Repository::with_criteria(self, criteria)
    }

    fn with_relationships(&self, relationships: Vec<String>) -> Self {
        Repository::with_relationships(self, relationships)
    }
}

//! Criteria-driven repository over a [`Connection`]
//!
//! A [`Repository`] carries base criteria and relationship names. Every read
//! merges the base criteria with the call's own (the call wins on a key
//! collision), applies them to a fresh query on the model's table, asks for
//! the accumulated relationships and executes.
//!
//! `update` and `delete` find the row first and then mutate it. The two
//! steps are not atomic: a row removed in between surfaces as `NotFound`.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::backends::Connection;
use crate::config::RepositoryConfig;
use crate::criteria::{apply_criteria, Criteria, Criterion};
use crate::error::{RepositoryError, RepositoryResult};
use crate::key::Key;
use crate::model::{fresh_timestamp, into_attributes, Attributes, Model};
use crate::pagination::Paginator;
use crate::query::{OrderDirection, QueryBuilder};
use crate::relations::eager_load;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// Repository of `M` rows
pub struct Repository<M: Model> {
    connection: Arc<dyn Connection>,
    config: Arc<RepositoryConfig>,
    criteria: Criteria,
    relationships: Vec<String>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for Repository<M> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            config: Arc::clone(&self.config),
            criteria: self.criteria.clone(),
            relationships: self.relationships.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> std::fmt::Debug for Repository<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &M::table_name())
            .field("backend", &self.connection.backend_name())
            .field("criteria", &self.criteria)
            .field("relationships", &self.relationships)
            .finish()
    }
}

impl<M: Model> Repository<M> {
    /// Create a repository with the default configuration
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::with_config(connection, RepositoryConfig::default())
    }

    pub fn with_config(connection: Arc<dyn Connection>, config: RepositoryConfig) -> Self {
        Self {
            connection,
            config: Arc::new(config),
            criteria: Criteria::new(),
            relationships: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Base criteria applied to every read
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Relationships eager loaded on every read
    pub fn relationships(&self) -> &[String] {
        &self.relationships
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// New repository with `criteria` merged over the base criteria
    pub fn with_criteria(&self, criteria: Criteria) -> Self {
        let mut repository = self.clone();
        repository.criteria.merge(&criteria);
        repository
    }

    /// New repository that also eager loads `relationships`
    pub fn with_relationships<I, S>(&self, relationships: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut repository = self.clone();
        for relationship in relationships {
            let relationship = relationship.into();
            if !repository.relationships.contains(&relationship) {
                repository.relationships.push(relationship);
            }
        }
        repository
    }

    /// Query for the base criteria merged with `criteria`, not yet executed
    pub fn query(&self, criteria: &Criteria) -> QueryBuilder {
        let merged = self.criteria.merged(criteria);
        QueryBuilder::table(M::table_name())
            .filter(|q| apply_criteria(q, &merged))
            .with(self.relationships.iter().cloned())
    }

    pub async fn count(&self, criteria: Criteria) -> RepositoryResult<u64> {
        tracing::debug!("Counting {} rows", M::table_name());
        self.connection.count(&self.query(&criteria)).await
    }

    pub async fn all(&self) -> RepositoryResult<Vec<M>> {
        tracing::debug!("Fetching all {} rows", M::table_name());
        self.get(self.query(&Criteria::new())).await
    }

    /// First page of rows matching `criteria`
    pub async fn paginate(
        &self,
        criteria: Criteria,
        per_page: Option<u64>,
    ) -> RepositoryResult<Paginator<M>> {
        self.paginate_page(criteria, per_page, 1).await
    }

    /// Page `page` (1-based, 0 treated as 1) of rows matching `criteria`
    pub async fn paginate_page(
        &self,
        criteria: Criteria,
        per_page: Option<u64>,
        page: u64,
    ) -> RepositoryResult<Paginator<M>> {
        let per_page = self.config.resolve_per_page(per_page);
        let page = page.max(1);
        tracing::debug!(
            "Paginating {} rows: page {} of size {}",
            M::table_name(),
            page,
            per_page
        );

        let query = self.query(&criteria);
        let total = self.connection.count(&query).await?;
        let query = query
            .order_by(M::primary_key_name(), OrderDirection::Asc)
            .for_page(page, per_page);
        let items = self.get(query).await?;

        Ok(Paginator::new(items, total, per_page, page))
    }

    /// Row with primary key `id`
    pub async fn find(&self, id: impl Into<Key>) -> RepositoryResult<M> {
        let id = id.into();
        tracing::debug!("Finding {} row {}", M::table_name(), id);
        let row = self.find_row(&id).await?;
        M::from_attributes(row)
    }

    /// First row where `field` matches `value`
    pub async fn find_by(&self, field: &str, value: impl Into<Criterion>) -> RepositoryResult<M> {
        self.find_by_many(Criteria::new().with(field, value)).await
    }

    /// First row matching `criteria`
    ///
    /// When several rows match, the one with the lowest primary key wins.
    /// Pin a unique column in `criteria` if that is not what you want.
    pub async fn find_by_many(&self, criteria: Criteria) -> RepositoryResult<M> {
        tracing::debug!("Finding {} row by {:?}", M::table_name(), criteria.fields());
        let query = self
            .query(&criteria)
            .order_by(M::primary_key_name(), OrderDirection::Asc)
            .limit(1);
        self.get(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(M::table_name(), None))
    }

    /// Rows where `field` matches `value`
    pub async fn get_where(
        &self,
        field: &str,
        value: impl Into<Criterion>,
    ) -> RepositoryResult<Vec<M>> {
        self.get_where_many(Criteria::new().with(field, value)).await
    }

    /// Rows matching `criteria`
    pub async fn get_where_many(&self, criteria: Criteria) -> RepositoryResult<Vec<M>> {
        tracing::debug!("Fetching {} rows by {:?}", M::table_name(), criteria.fields());
        self.get(self.query(&criteria)).await
    }

    /// Create a row from mass-assignable `data`
    pub async fn store(&self, data: Value) -> RepositoryResult<M> {
        let mut attributes = M::new_instance();
        M::fill(&mut attributes, into_attributes(data)?);

        if M::uses_timestamps() {
            let now = fresh_timestamp();
            for column in [CREATED_AT, UPDATED_AT] {
                if !attributes.contains_key(column) {
                    attributes.insert(column.to_string(), now.clone());
                }
            }
        }

        tracing::debug!(
            "Storing {} row via {} backend",
            M::table_name(),
            self.connection.backend_name()
        );
        let row = self
            .connection
            .insert(M::table_name(), M::primary_key_name(), attributes)
            .await?;
        M::from_attributes(row)
    }

    /// Apply mass-assignable `data` to the row with primary key `id`
    ///
    /// The changes are checked against `M` before anything is written.
    pub async fn update(&self, id: impl Into<Key>, data: Value) -> RepositoryResult<M> {
        let id = id.into();
        let data = into_attributes(data)?;
        let mut row = self.find_row(&id).await?;
        // Fixed before filling: a fillable primary key in `data` renames the row
        let key = stored_key::<M>(&row, &id);

        let mut changes = M::fill(&mut row, data);
        if changes.is_empty() {
            tracing::debug!("Nothing to update on {} row {}", M::table_name(), id);
            return M::from_attributes(row);
        }

        if M::uses_timestamps() && !changes.contains_key(UPDATED_AT) {
            let now = fresh_timestamp();
            row.insert(UPDATED_AT.to_string(), now.clone());
            changes.insert(UPDATED_AT.to_string(), now);
        }

        M::from_attributes(row.clone())?;

        tracing::debug!(
            "Updating {} row {}: {:?}",
            M::table_name(),
            id,
            changes.keys().collect::<Vec<_>>()
        );
        let mut updated = self
            .connection
            .update(M::table_name(), M::primary_key_name(), &key, changes)
            .await?
            .ok_or_else(|| RepositoryError::not_found(M::table_name(), Some(id.to_string())))?;

        eager_load::<M>(
            self.connection.as_ref(),
            std::slice::from_mut(&mut updated),
            &self.relationships,
        )
        .await?;
        M::from_attributes(updated)
    }

    /// Delete the row with primary key `id`
    pub async fn delete(&self, id: impl Into<Key>) -> RepositoryResult<bool> {
        let id = id.into();
        let row = self.find_row(&id).await?;

        tracing::debug!("Deleting {} row {}", M::table_name(), id);
        let key = stored_key::<M>(&row, &id);
        let removed = self
            .connection
            .delete(M::table_name(), M::primary_key_name(), &key)
            .await?;

        if removed == 0 {
            return Err(RepositoryError::not_found(M::table_name(), Some(id.to_string())));
        }
        Ok(true)
    }

    async fn find_row(&self, id: &Key) -> RepositoryResult<Attributes> {
        let query = self
            .query(&Criteria::new())
            .where_eq(M::primary_key_name(), id.to_value())
            .limit(1);
        self.rows(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(M::table_name(), Some(id.to_string())))
    }

    async fn rows(&self, query: QueryBuilder) -> RepositoryResult<Vec<Attributes>> {
        let mut rows = self.connection.fetch(&query).await?;
        eager_load::<M>(self.connection.as_ref(), &mut rows, query.eager_loads()).await?;
        Ok(rows)
    }

    async fn get(&self, query: QueryBuilder) -> RepositoryResult<Vec<M>> {
        self.rows(query)
            .await?
            .into_iter()
            .map(M::from_attributes)
            .collect()
    }
}

/// Key as stored on the row, falling back to the one the caller passed
fn stored_key<M: Model>(row: &Attributes, id: &Key) -> Value {
    row.get(M::primary_key_name())
        .filter(|value| !value.is_null())
        .cloned()
        .unwrap_or_else(|| id.to_value())
}

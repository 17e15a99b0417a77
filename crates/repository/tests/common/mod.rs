//! Dummy models and fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use elif_repository::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyRelationModel {
    pub id: i64,
    pub name: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Model for DummyRelationModel {
    fn table_name() -> &'static str {
        "dummy_relation_models"
    }

    fn primary_key(&self) -> Option<Key> {
        Some(Key::from(self.id))
    }

    fn uses_timestamps() -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyModel {
    pub id: i64,
    pub name: String,
    pub dummy_relation_model_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<DummyRelationModel>,
}

impl Model for DummyModel {
    fn table_name() -> &'static str {
        "dummy_models"
    }

    fn primary_key(&self) -> Option<Key> {
        Some(Key::from(self.id))
    }

    fn fillable() -> &'static [&'static str] {
        &["id", "name", "dummy_relation_model_id"]
    }

    fn uses_timestamps() -> bool {
        true
    }

    fn relationships() -> Vec<Relation> {
        vec![Relation::belongs_to(
            "relation",
            "dummy_relation_models",
            "dummy_relation_model_id",
        )]
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory database with the dummy tables created
pub async fn connection() -> Arc<MemoryConnection> {
    init_tracing();

    let connection = MemoryConnection::new();
    connection
        .create_table(
            TableSchema::create("dummy_models")
                .required("name")
                .nullable("dummy_relation_model_id")
                .timestamps(),
        )
        .await;
    connection
        .create_table(
            TableSchema::create("dummy_relation_models")
                .required("name")
                .timestamps(),
        )
        .await;
    Arc::new(connection)
}

pub fn repository(connection: &Arc<MemoryConnection>) -> Repository<DummyModel> {
    Repository::new(connection.clone())
}

/// Store one dummy model per name, ids assigned 1..=n
pub async fn seed(repository: &Repository<DummyModel>, names: &[&str]) -> Vec<DummyModel> {
    let mut models = Vec::new();
    for name in names {
        let model = repository
            .store(json!({ "name": name }))
            .await
            .expect("seed dummy model");
        models.push(model);
    }
    models
}

pub fn ids(models: &[DummyModel]) -> Vec<i64> {
    models.iter().map(|m| m.id).collect()
}

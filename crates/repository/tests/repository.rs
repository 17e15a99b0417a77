mod common;

use common::{connection, ids, repository, seed, DummyModel, DummyRelationModel};
use elif_repository::prelude::*;
use serde_json::{json, Value};

#[tokio::test]
async fn test_count() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy"]).await;

    assert_eq!(repository.count(Criteria::new()).await.unwrap(), 1);
    assert_eq!(
        repository
            .count(Criteria::new().eq("name", "other"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_all() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy"]).await;

    assert_eq!(repository.all().await.unwrap(), models);
}

#[tokio::test]
async fn test_paginate() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2", "dummy3", "dummy4"]).await;

    let page = repository.paginate(Criteria::new(), None).await.unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.per_page, 15);
    assert_eq!(page.items.len(), 4);

    let page = repository.paginate(Criteria::new(), Some(2)).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 4);
    assert_eq!(page.last_page(), 2);
    assert!(page.has_more_pages());
}

#[tokio::test]
async fn test_paginate_page() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2", "dummy3", "dummy4"]).await;

    let page = repository
        .paginate_page(Criteria::new(), Some(2), 2)
        .await
        .unwrap();

    assert_eq!(ids(&page.items), vec![3, 4]);
    assert_eq!(page.from(), Some(3));
    assert!(!page.has_more_pages());
}

#[tokio::test]
async fn test_paginate_far_page_is_empty() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2"]).await;

    let page = repository
        .paginate_page(Criteria::new(), Some(15), u64::MAX)
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total, 2);
    assert_eq!(page.current_page, u64::MAX);
}

#[tokio::test]
async fn test_paginate_with_criteria() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1", "dummy2", "dummy3", "dummy4"]).await;

    let page = repository
        .paginate(Criteria::new().is_in("id", vec![1, 3]), None)
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.items, vec![models[0].clone(), models[2].clone()]);
}

#[tokio::test]
async fn test_find() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1"]).await;

    assert_eq!(repository.find(1).await.unwrap(), models[0]);

    let error = repository.find(2).await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_find_by() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1"]).await;

    assert_eq!(repository.find_by("id", 1).await.unwrap(), models[0]);
    assert_eq!(repository.find_by("name", "dummy1").await.unwrap(), models[0]);
    assert!(repository
        .find_by("name", "missing")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_find_by_many() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1"]).await;

    let found = repository
        .find_by_many(Criteria::new().eq("id", 1))
        .await
        .unwrap();
    assert_eq!(found, models[0]);
}

#[tokio::test]
async fn test_find_by_many_returns_lowest_key_when_ambiguous() {
    let connection = connection().await;
    let repository = repository(&connection);
    repository
        .store(json!({"id": 7, "name": "twin"}))
        .await
        .unwrap();
    repository
        .store(json!({"id": 3, "name": "twin"}))
        .await
        .unwrap();

    let found = repository
        .find_by_many(Criteria::new().eq("name", "twin"))
        .await
        .unwrap();
    assert_eq!(found.id, 3);
}

#[tokio::test]
async fn test_get_where() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1"]).await;

    assert_eq!(repository.get_where("id", 1).await.unwrap(), models);
    assert!(repository.get_where("id", 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_where_many() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["a", "b", "c"]).await;

    assert_eq!(
        repository
            .get_where_many(Criteria::new().eq("id", 1))
            .await
            .unwrap(),
        vec![models[0].clone()]
    );

    let found = repository
        .get_where_many(Criteria::new().is_in("id", vec![1, 3]))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![1, 3]);
}

#[tokio::test]
async fn test_store() {
    let connection = connection().await;
    let repository = repository(&connection);

    let stored = repository
        .store(json!({"id": 12, "name": "dummy"}))
        .await
        .unwrap();

    assert_eq!(stored.id, 12);
    assert!(stored.created_at.is_some());
    assert_eq!(stored.created_at, stored.updated_at);
    assert_eq!(repository.find(12).await.unwrap(), stored);
}

#[tokio::test]
async fn test_store_then_find_new_id() {
    let connection = connection().await;
    let repository = repository(&connection);

    let stored = repository.store(json!({"name": "x"})).await.unwrap();
    let found = repository.find(stored.id).await.unwrap();

    assert_eq!(found.name, "x");
}

#[tokio::test]
async fn test_store_discards_guarded_attributes() {
    let connection = connection().await;
    let repository = repository(&connection);

    let stored = repository
        .store(json!({"name": "x", "created_at": "1999-01-01T00:00:00Z", "is_admin": true}))
        .await
        .unwrap();

    assert_ne!(stored.created_at.as_deref(), Some("1999-01-01T00:00:00Z"));
    let rows = connection.rows("dummy_models").await.unwrap();
    assert!(!rows[0].contains_key("is_admin"));
}

#[tokio::test]
async fn test_store_propagates_persistence_errors() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy"]).await;

    let missing_name = repository.store(json!({})).await.unwrap_err();
    assert!(matches!(missing_name, RepositoryError::Persistence(_)));

    let duplicate = repository
        .store(json!({"id": 1, "name": "again"}))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, RepositoryError::Persistence(_)));
}

#[tokio::test]
async fn test_store_largest_key() {
    let connection = connection().await;
    let repository = repository(&connection);

    let stored = repository
        .store(json!({"id": i64::MAX, "name": "edge"}))
        .await
        .unwrap();
    assert_eq!(stored.id, i64::MAX);

    let exhausted = repository.store(json!({"name": "after"})).await.unwrap_err();
    assert!(matches!(exhausted, RepositoryError::Persistence(_)));
}

#[tokio::test]
async fn test_store_rejects_non_object_data() {
    let connection = connection().await;
    let repository = repository(&connection);

    let error = repository.store(json!(["name"])).await.unwrap_err();
    assert!(matches!(error, RepositoryError::Serialization(_)));
}

#[tokio::test]
async fn test_update() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1"]).await;

    let updated = repository.update(1, json!({"name": "test"})).await.unwrap();

    assert_eq!(updated.name, "test");
    assert_eq!(updated.created_at, models[0].created_at);
    assert_eq!(updated.dummy_relation_model_id, None);
    assert_eq!(repository.find(1).await.unwrap().name, "test");
}

#[tokio::test]
async fn test_update_missing_row() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1"]).await;

    let error = repository
        .update(999, json!({"name": "test"}))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        RepositoryError::NotFound { ref key, .. } if key.as_deref() == Some("999")
    ));
}

#[tokio::test]
async fn test_update_writes_to_the_row_it_found() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["one", "two"]).await;

    let error = repository
        .update(1, json!({"id": 2, "name": "x"}))
        .await
        .unwrap_err();

    assert!(matches!(error, RepositoryError::Persistence(_)));
    assert_eq!(repository.find(1).await.unwrap().name, "one");
    assert_eq!(repository.find(2).await.unwrap().name, "two");
}

#[tokio::test]
async fn test_update_can_move_a_row_to_a_free_key() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["one"]).await;

    let moved = repository
        .update(1, json!({"id": 5, "name": "x"}))
        .await
        .unwrap();

    assert_eq!((moved.id, moved.name.as_str()), (5, "x"));
    assert!(repository.find(1).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_rejects_values_the_model_cannot_hold() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1"]).await;

    let error = repository.update(1, json!({"name": 5})).await.unwrap_err();

    assert!(matches!(error, RepositoryError::Serialization(_)));
    assert_eq!(repository.find(1).await.unwrap().name, "dummy1");
}

#[tokio::test]
async fn test_update_without_changes_returns_the_row() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy1"]).await;

    let unchanged = repository
        .update(1, json!({"updated_at": "ignored"}))
        .await
        .unwrap();

    assert_eq!(unchanged, models[0]);
}

#[tokio::test]
async fn test_delete() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1"]).await;

    assert!(repository.delete(1).await.unwrap());
    assert!(repository.find(1).await.unwrap_err().is_not_found());
    assert!(repository.delete(1).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_with_criteria() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2", "dummy3", "dummy4"]).await;

    let with_criteria = repository.with_criteria(Criteria::new().is_in("id", vec![1, 2, 3]));

    assert!(repository.criteria().is_empty());
    assert_eq!(with_criteria.criteria().len(), 1);
    assert_eq!(repository.all().await.unwrap().len(), 4);
    assert_eq!(with_criteria.all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_call_criteria_override_base_criteria() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2"]).await;

    let scoped = repository.with_criteria(Criteria::new().eq("id", 1));
    let found = scoped
        .get_where_many(Criteria::new().eq("id", 2))
        .await
        .unwrap();

    assert_eq!(ids(&found), vec![2]);
}

#[tokio::test]
async fn test_base_criteria_scope_find_update_and_delete() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2"]).await;

    let scoped = repository.with_criteria(Criteria::new().eq("name", "dummy1"));

    assert!(scoped.find(2).await.unwrap_err().is_not_found());
    assert!(scoped
        .update(2, json!({"name": "x"}))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(scoped.delete(2).await.unwrap_err().is_not_found());
    assert_eq!(repository.count(Criteria::new()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_disjoint_criteria_compose_like_their_union() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["a", "b", "a", "c"]).await;

    let first = Criteria::new().eq("name", "a");
    let second = Criteria::new().is_in("id", vec![1, 2, 4]);

    let chained = repository
        .with_criteria(first.clone())
        .with_criteria(second.clone());
    let united = repository.with_criteria(first.merged(&second));

    let chained = chained.all().await.unwrap();
    assert_eq!(ids(&chained), vec![1]);
    assert_eq!(chained, united.all().await.unwrap());
}

#[tokio::test]
async fn test_with_relationships() {
    let connection = connection().await;
    let relations: Repository<DummyRelationModel> = Repository::new(connection.clone());
    let relation = relations.store(json!({"name": "relation"})).await.unwrap();

    let repository = repository(&connection);
    let model = repository
        .store(json!({"id": 1, "name": "dummy", "dummy_relation_model_id": relation.id}))
        .await
        .unwrap();

    let with_relation = repository.with_relationships(["relation"]);

    assert!(repository.relationships().is_empty());
    assert_eq!(repository.find(1).await.unwrap(), model);
    assert_eq!(
        with_relation.find(1).await.unwrap(),
        DummyModel {
            relation: Some(relation.clone()),
            ..model.clone()
        }
    );

    let updated = with_relation
        .update(1, json!({"name": "renamed"}))
        .await
        .unwrap();
    assert_eq!(updated.relation, Some(relation));
}

#[tokio::test]
async fn test_relationships_are_deduplicated() {
    let connection = connection().await;
    let repository = repository(&connection)
        .with_relationships(["relation"])
        .with_relationships(vec!["relation".to_string()]);

    assert_eq!(repository.relationships(), ["relation".to_string()]);
}

#[tokio::test]
async fn test_unknown_relationship() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy"]).await;

    let error = repository
        .with_relationships(["missing"])
        .all()
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Relationship error: Call to undefined relationship [missing] on model [dummy_models]"
    );
}

#[tokio::test]
async fn test_criteria_where_null() {
    let connection = connection().await;
    let repository = repository(&connection);
    let models = seed(&repository, &["dummy"]).await;
    repository
        .store(json!({"name": "linked", "dummy_relation_model_id": 5}))
        .await
        .unwrap();

    let found = repository
        .find_by("dummy_relation_model_id", Value::Null)
        .await
        .unwrap();
    assert_eq!(found, models[0]);

    let nulls = repository
        .get_where("dummy_relation_model_id", None::<i64>)
        .await
        .unwrap();
    assert_eq!(ids(&nulls), vec![1]);
}

#[tokio::test]
async fn test_empty_set_matches_nothing() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["a", "b"]).await;

    let criteria = Criteria::new().is_in("id", Vec::<i64>::new());

    assert!(repository
        .get_where_many(criteria.clone())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(repository.count(criteria).await.unwrap(), 0);
}

#[tokio::test]
async fn test_closure_criteria() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["dummy1", "dummy2", "other", "dummy4"]).await;

    let criteria = Criteria::new()
        .raw("search", |q| q.where_like("name", "dummy%").or_where_eq("id", 3))
        .is_in("id", vec![2, 3, 4]);

    let found = repository.get_where_many(criteria).await.unwrap();
    assert_eq!(ids(&found), vec![2, 3, 4]);

    let narrowed = repository
        .get_where_many(Criteria::new().raw("search", |q| q.where_gt("id", 2)).eq("name", "dummy4"))
        .await
        .unwrap();
    assert_eq!(ids(&narrowed), vec![4]);
}

#[tokio::test]
async fn test_raw_sql_is_rejected_by_memory_backend() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["a"]).await;

    let error = repository
        .get_where_many(Criteria::new().raw("sql", |q| q.where_raw("length(name) > ?", vec![json!(1)])))
        .await
        .unwrap_err();

    assert!(matches!(error, RepositoryError::Query(_)));
}

#[tokio::test]
async fn test_unknown_column_is_a_persistence_error() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["a"]).await;

    let error = repository.get_where("nope", 1).await.unwrap_err();
    assert!(matches!(error, RepositoryError::Persistence(_)));
}

#[tokio::test]
async fn test_query_exposes_sql() {
    let connection = connection().await;
    let repository = repository(&connection).with_criteria(Criteria::new().is_null("dummy_relation_model_id"));

    let sql = repository.query(&Criteria::new().eq("name", "a")).to_sql();
    assert_eq!(
        sql,
        r#"SELECT * FROM "dummy_models" WHERE "dummy_relation_model_id" IS NULL AND "name" = $1"#
    );
}

async fn names_via_contract<R: RepositoryContract<DummyModel>>(repository: &R) -> Vec<String> {
    repository
        .get_where_many(Criteria::new())
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect()
}

#[tokio::test]
async fn test_repository_contract() {
    let connection = connection().await;
    let repository = repository(&connection);
    seed(&repository, &["a", "b"]).await;

    assert_eq!(names_via_contract(&repository).await, vec!["a", "b"]);

    let found = RepositoryContract::find(&repository, Key::from(2)).await.unwrap();
    assert_eq!(found.name, "b");
}

mod common;

use common::{memory_pool, role_repository, Role, ROLE_TABLE};
use serde_json::json;
use sqlx::Row;
use stratum_core::StratumConfig;
use stratum_data::{
    fields, Adapter, DataError, DocumentSchema, Entity, FieldMap, Query, Repository,
    RepositoryFactory, Schema, SchemaOptions, IMMUTABLE_MESSAGE, UNIQUE_MESSAGE,
};
use stratum_data_sqlx::{SqlxAdapter, SqlxConnectionHandler};

#[tokio::test]
async fn create_then_get_round_trips() {
    let repo = role_repository().await;

    let created = repo
        .create(fields! { "name" => "ADMIN", "created_by" => "john" })
        .await
        .unwrap();
    assert_eq!(created.id, Some(1));
    assert_eq!(repo.get(1).await.unwrap(), created);

    let anonymous = repo.create(fields! { "name" => "GUEST" }).await.unwrap();
    let fetched = repo.get(anonymous.id.unwrap()).await.unwrap();
    assert_eq!(fetched.created_by, None);
}

#[tokio::test]
async fn rows_are_written_to_the_schema_table() {
    let repo = role_repository().await;
    repo.create(fields! { "name" => "ADMIN", "created_by" => "john" })
        .await
        .unwrap();

    let row = sqlx::query("SELECT name, created_by FROM role WHERE id = 1")
        .fetch_one(repo.adapter().pool())
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("name"), "ADMIN");
    assert_eq!(row.get::<String, _>("created_by"), "john");
}

#[tokio::test]
async fn role_scenario() {
    let repo = role_repository().await;

    repo.create(fields! { "name" => "ADMIN" }).await.unwrap();
    let err = repo.create(fields! { "name" => "ADMIN" }).await.unwrap_err();
    let validation = err.validation().unwrap();
    assert_eq!(
        serde_json::to_value(validation.messages()).unwrap(),
        json!({ "name": ["is already in use"] })
    );
    assert_eq!(validation.schema(), Some("role"));

    let editor = repo.create(fields! { "name" => "EDITOR" }).await.unwrap();
    let err = repo
        .update(editor.id.unwrap(), &fields! { "name" => "ADMIN" })
        .await
        .unwrap_err();
    assert_eq!(
        err.validation().unwrap().field_messages("name").unwrap(),
        [UNIQUE_MESSAGE]
    );

    let renamed = repo
        .update(editor.id.unwrap(), &fields! { "name" => "AUTHOR", "created_by" => "mary" })
        .await
        .unwrap();
    assert_eq!(repo.get(editor.id.unwrap()).await.unwrap(), renamed);
}

#[tokio::test]
async fn second_page_of_five() {
    let repo = role_repository().await;
    for name in ["E", "B", "D", "A", "C"] {
        repo.create(fields! { "name" => name }).await.unwrap();
    }

    let page = repo
        .filter(Query::new().page(2).per_page(2).order_by("name"))
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    let names: Vec<_> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["C", "D"]);

    let desc = repo
        .filter(Query::new().per_page(3).order_by("-name"))
        .await
        .unwrap();
    let names: Vec<_> = desc.into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["E", "D", "C"]);
}

#[tokio::test]
async fn filter_and_exclude_handle_null_columns() {
    let repo = role_repository().await;
    repo.create(fields! { "name" => "A", "created_by" => "john" }).await.unwrap();
    repo.create(fields! { "name" => "B" }).await.unwrap();
    repo.create(fields! { "name" => "C", "created_by" => "john" }).await.unwrap();

    let johns = repo
        .filter(Query::new().filter("created_by", "john"))
        .await
        .unwrap();
    assert_eq!(johns.total, 2);

    let unowned = repo
        .filter(Query::new().filter("created_by", serde_json::Value::Null))
        .await
        .unwrap();
    assert_eq!(unowned.total, 1);
    assert_eq!(unowned.first().unwrap().name, "B");

    // Only "A" matches both exclude pairs; "B" has a NULL owner and stays.
    let rest = repo
        .filter(
            Query::new()
                .order_by("name")
                .exclude("name", "A")
                .exclude("created_by", "john"),
        )
        .await
        .unwrap();
    let names: Vec<_> = rest.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["B", "C"]);
}

#[tokio::test]
async fn exists_and_delete() {
    let repo = role_repository().await;
    let admin = repo.create(fields! { "name" => "ADMIN" }).await.unwrap();

    let by_name = fields! { "name" => "ADMIN" };
    assert!(repo.exists(&FieldMap::new(), &by_name).await.unwrap());
    assert!(!repo
        .exists(&fields! { "id" => admin.id }, &by_name)
        .await
        .unwrap());

    repo.delete(admin.id.unwrap()).await.unwrap();
    assert!(!repo.exists(&FieldMap::new(), &by_name).await.unwrap());
    assert!(repo.get(admin.id.unwrap()).await.unwrap_err().is_not_found());
    assert!(repo.delete(admin.id.unwrap()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn update_keeps_other_rows_when_identifier_changes() {
    let repo = role_repository().await;
    repo.create(fields! { "name" => "ADMIN" }).await.unwrap();
    repo.create(fields! { "name" => "EDITOR" }).await.unwrap();

    let err = repo
        .update(1, &fields! { "id" => 2, "name" => "OWNER" })
        .await
        .unwrap_err();
    assert_eq!(
        err.validation().unwrap().field_messages("id").unwrap(),
        [IMMUTABLE_MESSAGE]
    );

    let rows = sqlx::query("SELECT id, name FROM role ORDER BY id")
        .fetch_all(repo.adapter().pool())
        .await
        .unwrap();
    let rows: Vec<(i64, String)> = rows.iter().map(|r| (r.get("id"), r.get("name"))).collect();
    assert_eq!(rows, [(1, "ADMIN".to_string()), (2, "EDITOR".to_string())]);
}

#[tokio::test]
async fn update_of_vanished_row_is_not_found() {
    let repo = role_repository().await;
    let ghost = Role {
        id: Some(77),
        name: "GHOST".into(),
        created_by: None,
    };
    let err = repo.adapter().update_record(ghost).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn table_constraint_backs_up_the_unique_check() {
    let repo = role_repository().await;
    let admin = Role::build(fields! { "name" => "ADMIN" }).unwrap();

    repo.adapter().create_record(admin.clone()).await.unwrap();
    let err = repo.adapter().create_record(admin).await.unwrap_err();
    assert!(matches!(err, DataError::Database(_)));
}

#[tokio::test]
async fn invalid_table_name_is_a_configuration_error() {
    struct ArchivedRoles;
    let options = SchemaOptions::builder::<ArchivedRoles>()
        .entity::<Role>()
        .schema_name("role archive")
        .build()
        .unwrap();
    let schema = DocumentSchema::<Role>::with_options(options).unwrap();
    let repo = Repository::new(SqlxAdapter::connect(memory_pool().await, schema)).unwrap();

    let err = repo.filter(Query::new()).await.unwrap_err();
    assert!(matches!(err, DataError::Configuration(_)));
}

#[tokio::test]
async fn handler_from_config_serves_registered_schemas() {
    let config = StratumConfig::from_yaml_str(
        r#"
stratum:
  bindings:
    default:
      url: "sqlite::memory:"
      max_connections: 1
"#,
        "test",
    )
    .unwrap();
    let handler = SqlxConnectionHandler::from_config(&config).await.unwrap();
    assert_eq!(handler.bindings(), ["default"]);

    let pool = handler.pool("default").unwrap();
    sqlx::query(ROLE_TABLE).execute(&pool).await.unwrap();

    let factory = RepositoryFactory::new(handler);
    let schema = DocumentSchema::<Role>::new().unwrap();
    factory.register(schema.options(), None).unwrap();

    let repo = factory
        .repository::<SqlxAdapter<DocumentSchema<Role>>>(schema)
        .await
        .unwrap();
    let admin = repo.create(fields! { "name" => "ADMIN" }).await.unwrap();
    assert_eq!(repo.get(admin.id.unwrap()).await.unwrap(), admin);

    factory.handler().close().await;
}

#[tokio::test]
async fn unknown_binding_is_a_configuration_error() {
    struct ArchivedRoles;
    let factory = RepositoryFactory::new(SqlxConnectionHandler::new());
    let options = SchemaOptions::builder::<ArchivedRoles>()
        .entity::<Role>()
        .bind("archive")
        .build()
        .unwrap();
    let schema = DocumentSchema::<Role>::with_options(options).unwrap();
    factory.register(schema.options(), None).unwrap();

    let result = factory
        .repository::<SqlxAdapter<DocumentSchema<Role>>>(schema)
        .await;
    assert!(matches!(result, Err(DataError::Configuration(msg)) if msg.contains("archive")));
}

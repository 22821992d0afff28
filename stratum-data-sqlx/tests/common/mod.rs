#![allow(dead_code)]

use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use stratum_data::{
    check_required, Adapter, DocumentSchema, Entity, EntityMeta, FieldDescriptor, FieldMap,
    Repository, ValidationError,
};
use stratum_data_sqlx::SqlxAdapter;

pub const ROLE_TABLE: &str = "CREATE TABLE role (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_by TEXT
)";

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: Option<i64>,
    pub name: String,
    pub created_by: Option<String>,
}

static ROLE: EntityMeta = EntityMeta {
    name: "Role",
    fields: &[
        FieldDescriptor::new("id").identifier(),
        FieldDescriptor::new("name").unique().required(),
        FieldDescriptor::new("created_by"),
    ],
};

impl Entity for Role {
    fn meta() -> &'static EntityMeta {
        &ROLE
    }

    fn build(data: FieldMap) -> Result<Self, ValidationError> {
        check_required(&ROLE, &data)?;
        let name = data.get("name").and_then(Value::as_str).unwrap_or_default();
        if name.chars().count() > 15 {
            return Err(ValidationError::field(
                "name",
                "Ensure this value has at most 15 characters",
            ));
        }
        Ok(Self {
            id: data.get("id").and_then(Value::as_i64),
            name: name.to_string(),
            created_by: data
                .get("created_by")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    fn value(&self, field: &str) -> Value {
        match field {
            "id" => json!(self.id),
            "name" => json!(self.name),
            "created_by" => json!(self.created_by),
            _ => Value::Null,
        }
    }
}

/// A single long-lived connection, so the in-memory database survives
/// between statements.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(ROLE_TABLE).execute(&pool).await.unwrap();
    pool
}

pub type RoleRepository = Repository<SqlxAdapter<DocumentSchema<Role>>>;

pub async fn role_repository() -> RoleRepository {
    let schema = DocumentSchema::<Role>::new().unwrap();
    Repository::new(SqlxAdapter::connect(memory_pool().await, schema)).unwrap()
}

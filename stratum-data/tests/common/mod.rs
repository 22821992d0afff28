#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stratum_data::{
    check_required, Adapter, ConnectionHandler, DataError, Entity, EntityMeta, EntityOf,
    FieldDescriptor, FieldMap, Pagination, Query, Schema, ValidationError,
};

pub const NAME_MAX_LENGTH: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: Option<i64>,
    pub name: String,
    pub created_by: Option<String>,
}

pub static ROLE: EntityMeta = EntityMeta {
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
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(ValidationError::field(
                "name",
                format!("Ensure this value has at most {NAME_MAX_LENGTH} characters"),
            ));
        }
        Ok(Self {
            id: data.get("id").and_then(Value::as_i64),
            name,
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

/// Entity with two unique fields besides its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Option<i64>,
    pub email: String,
    pub handle: String,
}

pub static ACCOUNT: EntityMeta = EntityMeta {
    name: "Account",
    fields: &[
        FieldDescriptor::new("id").identifier(),
        FieldDescriptor::new("email").unique().required(),
        FieldDescriptor::new("handle").unique().required(),
    ],
};

impl Entity for Account {
    fn meta() -> &'static EntityMeta {
        &ACCOUNT
    }

    fn build(data: FieldMap) -> Result<Self, ValidationError> {
        check_required(&ACCOUNT, &data)?;
        let text = |k: &str| {
            data.get(k)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(Self {
            id: data.get("id").and_then(Value::as_i64),
            email: text("email"),
            handle: text("handle"),
        })
    }

    fn value(&self, field: &str) -> Value {
        match field {
            "id" => json!(self.id),
            "email" => json!(self.email),
            "handle" => json!(self.handle),
            _ => Value::Null,
        }
    }
}

/// Shared rows plus call counters, one per test.
#[derive(Debug, Default)]
pub struct TestStore {
    rows: Mutex<Vec<FieldMap>>,
    next_id: AtomicI64,
    pub queries: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub writes: AtomicUsize,
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rows(&self) -> Vec<FieldMap> {
        self.rows.lock().unwrap().clone()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

/// Hands out the same store for every binding and records which ones were asked for.
#[derive(Default)]
pub struct TestHandler {
    pub store: Arc<TestStore>,
    pub binds: Mutex<Vec<String>>,
}

impl ConnectionHandler for TestHandler {
    type Connection = Arc<TestStore>;

    async fn get_connection(&self, bind: &str) -> Result<Arc<TestStore>, DataError> {
        self.binds.lock().unwrap().push(bind.to_string());
        Ok(self.store.clone())
    }
}

/// Minimal document adapter that counts the primitives it is asked to run.
pub struct RecordingAdapter<S> {
    store: Arc<TestStore>,
    schema: S,
}

impl<S: Schema<Record = FieldMap>> Adapter for RecordingAdapter<S> {
    type Schema = S;
    type Connection = Arc<TestStore>;

    fn connect(store: Arc<TestStore>, schema: S) -> Self {
        Self { store, schema }
    }

    fn schema(&self) -> &S {
        &self.schema
    }

    async fn filter_records(&self, query: &Query) -> Result<Pagination<FieldMap>, DataError> {
        self.store.queries.fetch_add(1, Ordering::SeqCst);
        let rows = self.store.rows.lock().unwrap();
        let (items, total) = query.apply(rows.iter());
        let items = items.into_iter().cloned().collect();
        Ok(Pagination::new(query.page, query.per_page, total, items))
    }

    async fn create_record(&self, entity: EntityOf<Self>) -> Result<EntityOf<Self>, DataError> {
        self.store.writes.fetch_add(1, Ordering::SeqCst);
        let mut record = self.schema.from_entity(&entity)?;
        let id_field = <S::Entity as Entity>::meta().identifier().map(|f| f.name).unwrap_or("id");
        if record.get(id_field).map_or(true, Value::is_null) {
            let id = self.store.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            record.insert(id_field.to_string(), json!(id));
        }
        self.store.rows.lock().unwrap().push(record.clone());
        self.schema.to_entity(record)
    }

    async fn update_record(&self, entity: EntityOf<Self>) -> Result<EntityOf<Self>, DataError> {
        self.store.writes.fetch_add(1, Ordering::SeqCst);
        let record = self.schema.from_entity(&entity)?;
        let id = entity.identifier();
        let mut rows = self.store.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|r| r.get("id") == Some(&id))
            .ok_or_else(|| DataError::NotFound(format!("no row with id {id}")))?;
        *slot = record.clone();
        drop(rows);
        self.schema.to_entity(record)
    }

    async fn delete_record(&self, identifier: &Value) -> Result<(), DataError> {
        self.store.writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.store.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.get("id") != Some(identifier));
        if rows.len() == before {
            return Err(DataError::NotFound(format!("no row with id {identifier}")));
        }
        Ok(())
    }

    async fn exists(&self, excludes: &FieldMap, filters: &FieldMap) -> Result<bool, DataError> {
        self.store.exists_calls.fetch_add(1, Ordering::SeqCst);
        let query = Query::new()
            .per_page(1)
            .filters(filters.clone())
            .excludes(excludes.clone());
        let rows = self.store.rows.lock().unwrap();
        Ok(rows.iter().any(|r| query.matches(r)))
    }
}

use crate::error::SqlxErrorExt;
use crate::query::QueryBuilder;
use crate::row::{bind_all, decode_row};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use stratum_data::{
    is_empty_value, Adapter, DataError, Entity, EntityOf, FieldMap, Pagination, Query, Schema,
};
use tracing::debug;

/// [`Adapter`] storing each schema in the SQLite table named after it.
///
/// Columns are the entity's declared fields. An identifier left empty on
/// create is omitted from the insert and read back from `last_insert_rowid()`,
/// so it should be an `INTEGER PRIMARY KEY` column.
pub struct SqlxAdapter<S> {
    pool: SqlitePool,
    schema: S,
}

impl<S: Schema<Record = FieldMap>> SqlxAdapter<S> {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn table(&self) -> &str {
        self.schema.name()
    }

    fn id_field(&self) -> Result<&'static str, DataError> {
        <S::Entity as Entity>::meta()
            .identifier()
            .map(|f| f.name)
            .ok_or_else(|| {
                DataError::Configuration(format!("schema `{}` has no identifier field", self.table()))
            })
    }

    /// Declared fields present in `record`, in declaration order.
    fn columns(record: &FieldMap, skip: Option<&str>) -> Vec<(&'static str, Value)> {
        <S::Entity as Entity>::meta()
            .fields
            .iter()
            .filter(|f| Some(f.name) != skip)
            .filter_map(|f| record.get(f.name).map(|v| (f.name, v.clone())))
            .collect()
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DataError> {
        debug!(schema = self.table(), sql, "Executing statement");
        let result = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(result.rows_affected())
    }

    fn not_found(&self, id: &Value) -> DataError {
        DataError::NotFound(format!(
            "{} object with identifier {id} does not exist",
            self.table()
        ))
    }
}

impl<S: Schema<Record = FieldMap>> Adapter for SqlxAdapter<S> {
    type Schema = S;
    type Connection = SqlitePool;

    fn connect(pool: SqlitePool, schema: S) -> Self {
        Self { pool, schema }
    }

    fn schema(&self) -> &S {
        &self.schema
    }

    async fn filter_records(&self, query: &Query) -> Result<Pagination<FieldMap>, DataError> {
        let builder = QueryBuilder::from_query(self.table(), query);
        let (sql, params) = builder
            .build_select(&["*"])
            .map_err(SqlxErrorExt::into_data_error)?;
        let (count_sql, count_params) = builder
            .build_count()
            .map_err(SqlxErrorExt::into_data_error)?;

        debug!(schema = self.table(), sql = %sql, "Selecting records");
        let rows = bind_all(sqlx::query(&sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let items = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;

        let total: i64 = bind_all(sqlx::query(&count_sql), count_params)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(SqlxErrorExt::into_data_error)?;

        Ok(Pagination::new(
            query.page,
            query.per_page,
            u64::try_from(total).unwrap_or_default(),
            items,
        ))
    }

    async fn create_record(&self, entity: EntityOf<Self>) -> Result<EntityOf<Self>, DataError> {
        let id_field = self.id_field()?;
        let mut record = self.schema.from_entity(&entity)?;
        let generate_id = record.get(id_field).map_or(true, is_empty_value);

        let columns = Self::columns(&record, generate_id.then_some(id_field));
        let (sql, params) = QueryBuilder::new(self.table())
            .build_insert(&columns)
            .map_err(SqlxErrorExt::into_data_error)?;

        debug!(schema = self.table(), sql = %sql, "Inserting record");
        let result = bind_all(sqlx::query(&sql), params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        if generate_id {
            record.insert(id_field.to_string(), Value::from(result.last_insert_rowid()));
        }

        self.schema.to_entity(record)
    }

    async fn update_record(&self, entity: EntityOf<Self>) -> Result<EntityOf<Self>, DataError> {
        let id_field = self.id_field()?;
        let id = entity.identifier();
        let record = self.schema.from_entity(&entity)?;

        let columns = Self::columns(&record, Some(id_field));
        let (sql, params) = QueryBuilder::new(self.table())
            .where_eq(id_field, id.clone())
            .build_update(&columns)
            .map_err(SqlxErrorExt::into_data_error)?;

        if self.execute(&sql, params).await? == 0 {
            return Err(self.not_found(&id));
        }
        self.schema.to_entity(record)
    }

    async fn delete_record(&self, identifier: &Value) -> Result<(), DataError> {
        let id_field = self.id_field()?;
        let (sql, params) = QueryBuilder::new(self.table())
            .where_eq(id_field, identifier.clone())
            .build_delete()
            .map_err(SqlxErrorExt::into_data_error)?;

        match self.execute(&sql, params).await? {
            0 => Err(self.not_found(identifier)),
            _ => Ok(()),
        }
    }

    async fn exists(&self, excludes: &FieldMap, filters: &FieldMap) -> Result<bool, DataError> {
        let mut builder = QueryBuilder::new(self.table());
        for (field, value) in filters {
            builder = builder.where_eq(field, value.clone());
        }
        let (sql, params) = builder
            .where_not_all(excludes.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .build_exists()
            .map_err(SqlxErrorExt::into_data_error)?;

        debug!(schema = self.table(), sql = %sql, "Checking existence");
        let row = bind_all(sqlx::query(&sql), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(row.is_some())
    }
}

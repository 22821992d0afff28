use crate::store::MemoryStore;
use serde_json::Value;
use stratum_data::{
    is_empty_value, Adapter, DataError, Entity, EntityOf, FieldMap, Pagination, Query, Schema,
};
use tracing::trace;

/// [`Adapter`] over a [`MemoryStore`], for any schema whose records are field maps.
///
/// Identifiers left empty on create are assigned from a per-schema counter
/// starting at 1.
pub struct MemoryAdapter<S> {
    store: MemoryStore,
    schema: S,
}

impl<S: Schema<Record = FieldMap>> MemoryAdapter<S> {
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Remove every record of this schema, returning how many were removed.
    pub fn delete_all(&self) -> usize {
        let removed = self
            .store
            .write(self.schema.name(), |table| std::mem::take(&mut table.rows).len());
        trace!(schema = self.schema.name(), removed, "Deleted all records");
        removed
    }

    fn id_field(&self) -> Result<&'static str, DataError> {
        <S::Entity as Entity>::meta()
            .identifier()
            .map(|f| f.name)
            .ok_or_else(|| {
                DataError::Configuration(format!(
                    "schema `{}` has no identifier field",
                    self.schema.name()
                ))
            })
    }
}

impl<S: Schema<Record = FieldMap>> Adapter for MemoryAdapter<S> {
    type Schema = S;
    type Connection = MemoryStore;

    fn connect(store: MemoryStore, schema: S) -> Self {
        Self { store, schema }
    }

    fn schema(&self) -> &S {
        &self.schema
    }

    async fn filter_records(&self, query: &Query) -> Result<Pagination<FieldMap>, DataError> {
        let (items, total): (Vec<FieldMap>, u64) = self
            .store
            .read(self.schema.name(), |table| {
                let (page, total) = query.apply(&table.rows);
                (page.into_iter().cloned().collect(), total)
            })
            .unwrap_or_default();
        trace!(schema = self.schema.name(), total, "Filtered records");
        Ok(Pagination::new(query.page, query.per_page, total, items))
    }

    async fn create_record(&self, entity: EntityOf<Self>) -> Result<EntityOf<Self>, DataError> {
        let id_field = self.id_field()?;
        let mut record = self.schema.from_entity(&entity)?;

        let record = self.store.write(self.schema.name(), |table| {
            match record.get(id_field) {
                Some(id) if !is_empty_value(id) => table.observe_id(id),
                _ => {
                    let id = table.next_id();
                    record.insert(id_field.to_string(), Value::from(id));
                }
            }
            table.rows.push(record.clone());
            record
        });
        trace!(schema = self.schema.name(), id = ?record.get(id_field), "Inserted record");

        self.schema.to_entity(record)
    }

    async fn update_record(&self, entity: EntityOf<Self>) -> Result<EntityOf<Self>, DataError> {
        let id_field = self.id_field()?;
        let id = entity.identifier();
        let record = self.schema.from_entity(&entity)?;

        let stored = self.store.write(self.schema.name(), |table| {
            let idx = table.position(id_field, &id)?;
            table.rows[idx] = record.clone();
            Some(record)
        });
        let record = stored.ok_or_else(|| {
            DataError::NotFound(format!(
                "{} object with identifier {id} does not exist",
                self.schema.name()
            ))
        })?;
        trace!(schema = self.schema.name(), %id, "Updated record");

        self.schema.to_entity(record)
    }

    async fn delete_record(&self, identifier: &Value) -> Result<(), DataError> {
        let id_field = self.id_field()?;
        let removed = self.store.write(self.schema.name(), |table| {
            table
                .position(id_field, identifier)
                .map(|idx| table.rows.remove(idx))
        });
        match removed {
            Some(_) => {
                trace!(schema = self.schema.name(), %identifier, "Deleted record");
                Ok(())
            }
            None => Err(DataError::NotFound(format!(
                "{} object with identifier {identifier} does not exist",
                self.schema.name()
            ))),
        }
    }

    async fn exists(&self, excludes: &FieldMap, filters: &FieldMap) -> Result<bool, DataError> {
        let query = Query::new()
            .filters(filters.clone())
            .excludes(excludes.clone());
        Ok(self
            .store
            .read(self.schema.name(), |table| table.rows.iter().any(|r| query.matches(r)))
            .unwrap_or(false))
    }
}

use crate::adapter::{Adapter, EntityOf};
use crate::entity::{Entity, FieldMap};
use crate::error::{DataError, ValidationError, IMMUTABLE_MESSAGE, UNIQUE_MESSAGE};
use crate::page::Pagination;
use crate::query::Query;
use crate::schema::Schema;
use crate::unique::{UniqueChecks, WriteMode};
use serde_json::Value;
use tracing::debug;

/// Backend-agnostic CRUD façade over an [`Adapter`].
///
/// Holds one adapter (and through it one connection and one schema). It is
/// meant to be short-lived: obtain one per logical operation or request
/// rather than sharing it between unrelated callers.
///
/// Writes run the unique-constraint check and the write as two separate
/// backend calls. Nothing here makes that pair atomic; rely on a backend
/// constraint where a race matters.
///
/// # Example
///
/// ```ignore
/// let repo = Repository::new(MemoryAdapter::connect(conn, DocumentSchema::<Role>::new()?))?;
/// let admin = repo.create(fields! { "name" => "ADMIN" }).await?;
/// let page = repo.filter(Query::new().per_page(20).order_by("-name")).await?;
/// ```
pub struct Repository<A: Adapter> {
    adapter: A,
}

impl<A: Adapter> Repository<A> {
    /// Wrap an adapter after checking its schema is bound to the adapter's
    /// entity type.
    pub fn new(adapter: A) -> Result<Self, DataError> {
        let options = adapter.schema().options();
        if !options.is_bound_to::<EntityOf<A>>() {
            return Err(DataError::Configuration(format!(
                "schema `{}` is bound to `{}` but its repository persists `{}`",
                options.schema_name(),
                options.entity_type(),
                std::any::type_name::<EntityOf<A>>()
            )));
        }
        Ok(Self { adapter })
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    pub fn schema(&self) -> &A::Schema {
        self.adapter.schema()
    }

    pub fn schema_name(&self) -> &str {
        self.schema().name()
    }

    /// Fetch the entity whose identifier equals `identifier`.
    ///
    /// # Errors
    ///
    /// `DataError::NotFound` when no record matches.
    pub async fn get(&self, identifier: impl Into<Value>) -> Result<EntityOf<A>, DataError> {
        let identifier = identifier.into();
        debug!(schema = self.schema_name(), %identifier, "Lookup object by identifier");

        let id_field = self.identifier_field()?;
        let query = Query::new().filter(id_field, identifier.clone());
        let record = self
            .adapter
            .filter_records(&query)
            .await?
            .into_first()
            .ok_or_else(|| {
                DataError::NotFound(format!(
                    "{} object with identifier {identifier} does not exist",
                    self.schema_name()
                ))
            })?;

        self.schema().to_entity(record)
    }

    /// Fetch a page of entities.
    ///
    /// An empty `order_by` falls back to the schema's default ordering.
    pub async fn filter(&self, query: Query) -> Result<Pagination<EntityOf<A>>, DataError> {
        let mut query = query.normalized();
        if query.order_by.is_empty() {
            query.order_by = self.schema().options().order_by().clone();
        }
        debug!(
            schema = self.schema_name(),
            filters = ?query.filters,
            excludes = ?query.excludes,
            order_by = ?query.order_by.as_slice(),
            page = query.page,
            per_page = query.per_page,
            "Query objects"
        );

        let records = self.adapter.filter_records(&query).await?;
        let schema = self.schema();
        records.try_map(|record| schema.to_entity(record))
    }

    /// Whether any record matches `filters` and not `excludes`.
    pub async fn exists(&self, excludes: &FieldMap, filters: &FieldMap) -> Result<bool, DataError> {
        self.adapter.exists(excludes, filters).await
    }

    /// Build an entity from `data`, check unique constraints and persist it.
    ///
    /// Returns the persisted entity, including store-assigned fields such as
    /// a generated identifier.
    pub async fn create(&self, data: FieldMap) -> Result<EntityOf<A>, DataError> {
        debug!(schema = self.schema_name(), ?data, "Creating new object");

        let entity = <EntityOf<A> as Entity>::build(data)?;
        self.validate_unique(&entity, WriteMode::Create).await?;
        self.adapter.create_record(entity).await
    }

    /// Apply `data` to the stored entity, check unique constraints and persist it.
    ///
    /// # Errors
    ///
    /// `DataError::Validation` keyed by the identifier field when `data`
    /// changes the identifier, before any unique check or write.
    pub async fn update(
        &self,
        identifier: impl Into<Value>,
        data: &FieldMap,
    ) -> Result<EntityOf<A>, DataError> {
        let identifier = identifier.into();
        debug!(schema = self.schema_name(), %identifier, ?data, "Updating existing object");

        let mut entity = self.get(identifier).await?;
        let stored_id = entity.identifier();
        entity.update(data)?;
        if entity.identifier() != stored_id {
            let id_field = self.identifier_field()?;
            debug!(schema = self.schema_name(), %stored_id, "Rejected identifier change");
            return Err(ValidationError::field(id_field, IMMUTABLE_MESSAGE)
                .with_schema(self.schema_name())
                .into());
        }
        self.validate_unique(&entity, WriteMode::Update).await?;
        self.adapter.update_record(entity).await
    }

    /// Remove the record with the given identifier.
    ///
    /// Unknown identifiers are reported however the adapter chooses to.
    pub async fn delete(&self, identifier: impl Into<Value>) -> Result<(), DataError> {
        let identifier = identifier.into();
        debug!(schema = self.schema_name(), %identifier, "Deleting object");
        self.adapter.delete_record(&identifier).await
    }

    /// Check every non-empty unique field of `entity` against stored records.
    ///
    /// Fields are checked one at a time in declaration order and the first
    /// conflict is returned as a validation error keyed by that field.
    pub async fn validate_unique(
        &self,
        entity: &EntityOf<A>,
        mode: WriteMode,
    ) -> Result<(), DataError> {
        let plan = UniqueChecks::for_entity(entity, mode);
        for (field, filter) in plan.filters() {
            if self.adapter.exists(&plan.excludes, &filter).await? {
                debug!(schema = self.schema_name(), field, "Unique constraint violated");
                return Err(ValidationError::field(field, UNIQUE_MESSAGE)
                    .with_schema(self.schema_name())
                    .into());
            }
        }
        Ok(())
    }

    fn identifier_field(&self) -> Result<&'static str, DataError> {
        self.schema()
            .options()
            .entity_meta()
            .identifier()
            .map(|f| f.name)
            .ok_or_else(|| {
                DataError::Configuration(format!(
                    "schema `{}` has no identifier field",
                    self.schema_name()
                ))
            })
    }
}

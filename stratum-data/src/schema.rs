use crate::connection::DEFAULT_BINDING;
use crate::entity::{Entity, EntityMeta, FieldMap};
use crate::error::DataError;
use crate::query::OrderBy;
use convert_case::{Case, Casing};
use std::marker::PhantomData;

/// Resolved, immutable configuration of a schema.
///
/// Built once per entity type through [`SchemaOptions::builder`]; a schema is
/// bound to exactly one entity type for its lifetime.
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    entity: &'static EntityMeta,
    entity_type: &'static str,
    schema_name: String,
    bind: String,
    order_by: OrderBy,
}

impl SchemaOptions {
    /// Start building options for the schema type `S`.
    ///
    /// The schema name defaults to the snake-cased name of `S`
    /// (`RoleSchema` becomes `role_schema`).
    pub fn builder<S: ?Sized>() -> SchemaOptionsBuilder {
        SchemaOptionsBuilder::new(short_type_name(std::any::type_name::<S>()))
    }

    pub fn entity_meta(&self) -> &'static EntityMeta {
        self.entity
    }

    /// Fully-qualified Rust type name of the bound entity.
    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Logical connection name this schema is persisted through.
    pub fn bind(&self) -> &str {
        &self.bind
    }

    /// Default ordering of filter results.
    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    /// Whether these options were built for the entity type `E`.
    pub fn is_bound_to<E: Entity>(&self) -> bool {
        self.entity_type == std::any::type_name::<E>()
    }
}

/// Builder for [`SchemaOptions`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SchemaOptionsBuilder {
    type_name: &'static str,
    entity: Option<(&'static EntityMeta, &'static str)>,
    schema_name: Option<String>,
    bind: Option<String>,
    order_by: OrderBy,
}

impl SchemaOptionsBuilder {
    fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            entity: None,
            schema_name: None,
            bind: None,
            order_by: OrderBy::default(),
        }
    }

    pub fn entity<E: Entity>(mut self) -> Self {
        self.entity = Some((E::meta(), std::any::type_name::<E>()));
        self
    }

    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<OrderBy>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Resolve the options.
    ///
    /// # Errors
    ///
    /// `DataError::Configuration` when no entity was set or the entity's
    /// field declarations are invalid.
    pub fn build(self) -> Result<SchemaOptions, DataError> {
        let (entity, entity_type) = self.entity.ok_or_else(|| {
            DataError::Configuration(format!(
                "schema `{}`: `entity` option must be set to a valid entity type",
                self.type_name
            ))
        })?;
        entity.validate()?;

        let schema_name = self
            .schema_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.type_name.to_case(Case::Snake));
        let bind = self
            .bind
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BINDING.to_string());

        Ok(SchemaOptions {
            entity,
            entity_type,
            schema_name,
            bind,
            order_by: self.order_by,
        })
    }
}

/// Strip module path and generic arguments from a `type_name` result.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Translation between an entity and its backend-native record.
///
/// Implementors supply both directions; the repository calls
/// [`from_entity`](Schema::from_entity) only on entities that passed their
/// own validation and [`to_entity`](Schema::to_entity) only on records
/// returned by the backend.
pub trait Schema: Send + Sync + 'static {
    type Entity: Entity;
    type Record: Send + 'static;

    fn options(&self) -> &SchemaOptions;

    fn name(&self) -> &str {
        self.options().schema_name()
    }

    fn from_entity(&self, entity: &Self::Entity) -> Result<Self::Record, DataError>;

    fn to_entity(&self, record: Self::Record) -> Result<Self::Entity, DataError>;
}

/// Schema storing an entity as a flat field map of its declared fields.
///
/// Suitable for any backend whose records are documents or rows keyed by
/// field name.
#[derive(Debug, Clone)]
pub struct DocumentSchema<E> {
    options: SchemaOptions,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> DocumentSchema<E> {
    /// Resolve options named after the entity (`Role` becomes `role`).
    pub fn new() -> Result<Self, DataError> {
        Self::with_options(
            SchemaOptionsBuilder::new(E::meta().name)
                .entity::<E>()
                .build()?,
        )
    }

    /// Use options resolved elsewhere; they must be bound to `E`.
    pub fn with_options(options: SchemaOptions) -> Result<Self, DataError> {
        if !options.is_bound_to::<E>() {
            return Err(DataError::Configuration(format!(
                "schema `{}` is bound to `{}`, not `{}`",
                options.schema_name(),
                options.entity_type(),
                std::any::type_name::<E>()
            )));
        }
        Ok(Self {
            options,
            _marker: PhantomData,
        })
    }
}

impl<E: Entity> Schema for DocumentSchema<E> {
    type Entity = E;
    type Record = FieldMap;

    fn options(&self) -> &SchemaOptions {
        &self.options
    }

    fn from_entity(&self, entity: &E) -> Result<FieldMap, DataError> {
        Ok(entity.to_fields())
    }

    fn to_entity(&self, record: FieldMap) -> Result<E, DataError> {
        let fields = E::meta()
            .fields
            .iter()
            .filter_map(|f| record.get(f.name).map(|v| (f.name.to_string(), v.clone())))
            .collect();
        E::build(fields).map_err(|err| err.with_schema(self.name()).into())
    }
}

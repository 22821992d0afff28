use crate::adapter::Adapter;
use crate::connection::ConnectionHandler;
use crate::entity::Entity;
use crate::error::DataError;
use crate::repository::Repository;
use crate::schema::{Schema, SchemaOptions};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

/// Registration of one entity type with the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// Short entity name (`Role`).
    pub name: String,
    /// Fully-qualified Rust type name (`my_app::domain::Role`).
    pub qualname: String,
    pub schema_name: String,
    /// Binding the entity's connections are obtained for.
    pub provider: String,
}

/// Registry of entity schemas, handing out repositories with live connections.
///
/// Each entity type is registered once, together with the binding its
/// connections come from.
///
/// # Example
///
/// ```ignore
/// let factory = RepositoryFactory::new(MemoryConnectionHandler::new());
/// let schema = DocumentSchema::<Role>::new()?;
/// factory.register(schema.options(), None)?;
///
/// let repo = factory.repository::<MemoryAdapter<_>>(schema).await?;
/// ```
pub struct RepositoryFactory<H> {
    handler: H,
    registry: DashMap<String, EntityRecord>,
}

impl<H: ConnectionHandler> RepositoryFactory<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            registry: DashMap::new(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Register the entity bound by `options`.
    ///
    /// The provider is `provider` if given, else the schema's binding.
    ///
    /// # Errors
    ///
    /// `DataError::Configuration` if the entity type is already registered.
    pub fn register(
        &self,
        options: &SchemaOptions,
        provider: Option<&str>,
    ) -> Result<EntityRecord, DataError> {
        let provider = provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| options.bind())
            .to_string();
        let qualname = options.entity_type().to_string();

        match self.registry.entry(qualname.clone()) {
            Entry::Occupied(_) => {
                warn!(entity = %qualname, "Rejected duplicate entity registration");
                Err(DataError::Configuration(format!(
                    "entity {qualname} has already been registered"
                )))
            }
            Entry::Vacant(slot) => {
                let record = EntityRecord {
                    name: options.entity_meta().name.to_string(),
                    qualname: qualname.clone(),
                    schema_name: options.schema_name().to_string(),
                    provider,
                };
                debug!(
                    entity = %qualname,
                    schema = %record.schema_name,
                    provider = %record.provider,
                    "Registered schema"
                );
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    pub fn is_registered<E: Entity>(&self) -> bool {
        self.registry.contains_key(std::any::type_name::<E>())
    }

    /// Look up a registration by fully-qualified or short entity name.
    ///
    /// # Errors
    ///
    /// `DataError::Configuration` when nothing matches, or when a short name
    /// matches entities registered from more than one path.
    pub fn entity_record(&self, name: &str) -> Result<EntityRecord, DataError> {
        if let Some(record) = self.registry.get(name) {
            return Ok(record.value().clone());
        }

        let mut matches = self
            .registry
            .iter()
            .filter(|r| r.name == name)
            .map(|r| r.value().clone());
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record),
            (Some(_), Some(_)) => Err(DataError::Configuration(format!(
                "entity with name {name} has been registered twice, use its fully qualified name"
            ))),
            (None, _) => Err(DataError::Configuration(format!(
                "no entity registered with name {name}"
            ))),
        }
    }

    /// All registrations, sorted by qualified name.
    pub fn records(&self) -> Vec<EntityRecord> {
        let mut records: Vec<_> = self.registry.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.qualname.cmp(&b.qualname));
        records
    }

    /// Build a repository for a registered schema, with a connection for the
    /// entity's provider.
    pub async fn repository<A>(&self, schema: A::Schema) -> Result<Repository<A>, DataError>
    where
        A: Adapter<Connection = H::Connection>,
    {
        let qualname = schema.options().entity_type();
        let provider = self
            .registry
            .get(qualname)
            .map(|r| r.provider.clone())
            .ok_or_else(|| {
                DataError::Configuration(format!(
                    "entity {qualname} is not registered; register its schema first"
                ))
            })?;

        let conn = self.handler.get_connection(&provider).await?;
        Repository::new(A::connect(conn, schema))
    }
}

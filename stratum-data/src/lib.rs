//! # stratum-data: backend-agnostic data layer
//!
//! Domain entities are read, created, updated and deleted through a uniform
//! [`Repository`] while storage mechanics live in pluggable [`Adapter`]s.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Entity`] | Domain object contract: field declarations, construction, partial update |
//! | [`SchemaOptions`] / [`Schema`] | Per-entity configuration and entity/record translation |
//! | [`DocumentSchema`] | Ready-made schema storing entities as field maps |
//! | [`Adapter`] | Backend primitives: filter, create, update, delete, exists |
//! | [`Repository`] | CRUD façade with identifier lookup and unique-constraint validation |
//! | [`ConnectionHandler`] | Connection lifecycle boundary, keyed by binding name |
//! | [`RepositoryFactory`] | Registry of schemas handing out repositories |
//! | [`Pagination`] / [`Query`] | Paged results and query arguments |
//! | [`DataError`] / [`ValidationError`] | Error taxonomy |
//!
//! Backends ship as separate crates (`stratum-data-memory`, `stratum-data-sqlx`).

pub mod adapter;
pub mod connection;
pub mod entity;
pub mod error;
pub mod page;
pub mod query;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod unique;

pub use adapter::{Adapter, EntityOf, RecordOf};
pub use connection::{ConnectionHandler, DEFAULT_BINDING};
pub use entity::{check_required, is_empty_value, Entity, EntityMeta, FieldDescriptor, FieldMap};
pub use error::{DataError, ValidationError, IMMUTABLE_MESSAGE, REQUIRED_MESSAGE, UNIQUE_MESSAGE};
pub use page::Pagination;
pub use query::{OrderBy, OrderKey, Query};
pub use registry::{EntityRecord, RepositoryFactory};
pub use repository::Repository;
pub use schema::{DocumentSchema, Schema, SchemaOptions, SchemaOptionsBuilder};
pub use unique::{UniqueChecks, WriteMode};

/// Re-exported so [`fields!`] works without a direct `serde_json` dependency.
#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a [`FieldMap`] from `key => value` pairs.
///
/// # Example
///
/// ```ignore
/// let data = stratum_data::fields! { "name" => "ADMIN", "level" => 3 };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::FieldMap::new()
    };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::FieldMap::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::__serde_json::json!($value),
            );
        )+
        map
    }};
}

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        fields, Adapter, ConnectionHandler, DataError, DocumentSchema, Entity, EntityMeta,
        FieldDescriptor, FieldMap, OrderBy, Pagination, Query, Repository, RepositoryFactory,
        Schema, SchemaOptions, ValidationError,
    };
}

use crate::entity::FieldMap;
use crate::error::DataError;
use crate::page::Pagination;
use crate::query::Query;
use crate::schema::Schema;
use serde_json::Value;
use std::future::Future;

/// Record type of an adapter's schema.
pub type RecordOf<A> = <<A as Adapter>::Schema as Schema>::Record;

/// Entity type of an adapter's schema.
pub type EntityOf<A> = <<A as Adapter>::Schema as Schema>::Entity;

/// Backend-specific primitives behind a [`Repository`](crate::Repository).
///
/// These are the only places where storage knowledge enters; identifier
/// lookup, ordering defaults, unique-constraint validation and
/// entity/record translation stay in the repository.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait Adapter: Send + Sync + Sized {
    type Schema: Schema;
    type Connection: Send + 'static;

    /// Wrap a connection obtained from a [`ConnectionHandler`](crate::ConnectionHandler).
    fn connect(conn: Self::Connection, schema: Self::Schema) -> Self;

    fn schema(&self) -> &Self::Schema;

    /// Return the requested page of raw records. Must honour `page`,
    /// `per_page`, ordering, filters and excludes; `total` counts every match.
    fn filter_records(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<Pagination<RecordOf<Self>>, DataError>> + Send;

    /// Persist a new entity and return it with any store-assigned fields.
    fn create_record(
        &self,
        entity: EntityOf<Self>,
    ) -> impl Future<Output = Result<EntityOf<Self>, DataError>> + Send;

    fn update_record(
        &self,
        entity: EntityOf<Self>,
    ) -> impl Future<Output = Result<EntityOf<Self>, DataError>> + Send;

    fn delete_record(&self, identifier: &Value) -> impl Future<Output = Result<(), DataError>> + Send;

    /// Whether any record matches `filters` without matching `excludes`.
    ///
    /// Built on [`filter_records`](Adapter::filter_records) by default;
    /// override with a cheaper backend check where one exists.
    fn exists(
        &self,
        excludes: &FieldMap,
        filters: &FieldMap,
    ) -> impl Future<Output = Result<bool, DataError>> + Send {
        let query = Query::new()
            .per_page(1)
            .filters(filters.clone())
            .excludes(excludes.clone());
        async move { Ok(!self.filter_records(&query).await?.is_empty()) }
    }
}

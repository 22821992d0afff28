use crate::error::DataError;
use std::future::Future;

/// Binding name used when a schema does not declare one.
pub const DEFAULT_BINDING: &str = "default";

/// Produces backend connections (or sessions, or pools) by binding name.
///
/// Lifetime and pooling policy belong to the implementation. A repository is
/// only ever constructed with a connection obtained through this boundary.
pub trait ConnectionHandler: Send + Sync {
    type Connection: Send + 'static;

    fn get_connection(
        &self,
        bind: &str,
    ) -> impl Future<Output = Result<Self::Connection, DataError>> + Send;
}

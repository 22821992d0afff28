use crate::store::MemoryStore;
use dashmap::DashMap;
use stratum_data::{ConnectionHandler, DataError};

/// Hands out one shared [`MemoryStore`] per binding name.
///
/// Stores are created on first request; repositories obtained for the same
/// binding see each other's writes.
#[derive(Debug, Default)]
pub struct MemoryConnectionHandler {
    stores: DashMap<String, MemoryStore>,
}

impl MemoryConnectionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store behind `bind`, created if needed.
    pub fn store(&self, bind: &str) -> MemoryStore {
        self.stores.entry(bind.to_string()).or_default().clone()
    }
}

impl ConnectionHandler for MemoryConnectionHandler {
    type Connection = MemoryStore;

    async fn get_connection(&self, bind: &str) -> Result<MemoryStore, DataError> {
        tracing::trace!(bind, "Memory connection requested");
        Ok(self.store(bind))
    }
}

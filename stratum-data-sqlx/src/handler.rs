use crate::error::SqlxErrorExt;
use dashmap::DashMap;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use stratum_core::config::BindingConfig;
use stratum_core::StratumConfig;
use stratum_data::{ConnectionHandler, DataError};
use tracing::{debug, info};

/// One SQLite connection pool per binding name.
///
/// Pools come from configuration ([`from_config`](Self::from_config)) or are
/// registered directly with [`add_pool`](Self::add_pool). Asking for a
/// binding without a pool is a configuration error.
#[derive(Debug, Default)]
pub struct SqlxConnectionHandler {
    pools: DashMap<String, SqlitePool>,
}

impl SqlxConnectionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a pool for every binding under `stratum.bindings`.
    pub async fn from_config(config: &StratumConfig) -> Result<Self, DataError> {
        let handler = Self::new();
        for name in config.binding_names() {
            let binding = config
                .binding(&name)
                .map_err(|e| DataError::Configuration(e.to_string()))?;
            let pool = connect(&binding).await?;
            handler.add_pool(&name, pool);
        }
        Ok(handler)
    }

    pub fn add_pool(&self, bind: &str, pool: SqlitePool) {
        debug!(bind, "Registered connection pool");
        self.pools.insert(bind.to_string(), pool);
    }

    pub fn pool(&self, bind: &str) -> Option<SqlitePool> {
        self.pools.get(bind).map(|p| p.value().clone())
    }

    pub fn bindings(&self) -> Vec<String> {
        let mut names: Vec<_> = self.pools.iter().map(|p| p.key().clone()).collect();
        names.sort();
        names
    }

    /// Close every pool. Connections handed out earlier stop working.
    pub async fn close(&self) {
        let pools: Vec<_> = self.pools.iter().map(|p| p.value().clone()).collect();
        for pool in pools {
            pool.close().await;
        }
    }
}

/// Open a pool for one binding, creating the database file if needed.
pub async fn connect(binding: &BindingConfig) -> Result<SqlitePool, DataError> {
    let options = SqliteConnectOptions::from_str(&binding.url)
        .map_err(SqlxErrorExt::into_data_error)?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(binding.max_connections)
        .connect_with(options)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    info!(
        bind = %binding.name,
        max_connections = binding.max_connections,
        "Connected SQLite pool"
    );
    Ok(pool)
}

impl ConnectionHandler for SqlxConnectionHandler {
    type Connection = SqlitePool;

    async fn get_connection(&self, bind: &str) -> Result<SqlitePool, DataError> {
        self.pool(bind).ok_or_else(|| {
            DataError::Configuration(format!("no connection pool for binding `{bind}`"))
        })
    }
}

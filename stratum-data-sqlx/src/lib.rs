//! # stratum-data-sqlx: SQLx backend for Stratum data
//!
//! Stores each schema in the table named after it and talks to the database
//! through [SQLx](https://github.com/launchbadge/sqlx).
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QueryBuilder`] | Checked, quoted SQL for select/count/exists/insert/update/delete |
//! | [`SqlxConnectionHandler`] | One pool per binding, opened from `StratumConfig` |
//! | [`SqlxAdapter`] | `Adapter` implementation over a pool |
//! | [`SqlxErrorExt`] | Converts `sqlx::Error` into `DataError` (`.into_data_error()`) |
//!
//! # Feature flags
//!
//! | Feature  | Driver |
//! |----------|--------|
//! | `sqlite` (default) | SQLite via `sqlx/sqlite` |
//!
//! # Quick start
//!
//! ```ignore
//! let config = StratumConfig::load("dev")?;
//! let factory = RepositoryFactory::new(SqlxConnectionHandler::from_config(&config).await?);
//!
//! let schema = DocumentSchema::<Role>::new()?;
//! factory.register(schema.options(), None)?;
//! let roles = factory.repository::<SqlxAdapter<_>>(schema).await?;
//! ```

pub mod error;
pub mod query;

#[cfg(feature = "sqlite")]
mod adapter;
#[cfg(feature = "sqlite")]
pub mod handler;
#[cfg(feature = "sqlite")]
mod row;

pub use error::SqlxErrorExt;
pub use query::{QueryBuilder, QueryError};

#[cfg(feature = "sqlite")]
pub use adapter::SqlxAdapter;
#[cfg(feature = "sqlite")]
pub use handler::SqlxConnectionHandler;

/// Re-exports of the most commonly used types from both `stratum-data` and this crate.
pub mod prelude {
    pub use crate::SqlxErrorExt;
    #[cfg(feature = "sqlite")]
    pub use crate::{SqlxAdapter, SqlxConnectionHandler};
    pub use stratum_data::prelude::*;
}

//! Stratum: backend-agnostic repositories for domain entities.
//!
//! This facade crate re-exports the Stratum sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use stratum::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate                          |
//! |----------|---------|--------------------------------|
//! | `memory` | **yes** | `stratum-data-memory`          |
//! | `sqlx`   | no      | `stratum-data-sqlx`            |
//! | `sqlite` | no      | `stratum-data-sqlx/sqlite`     |
//! | `full`   | no      | All of the above               |

pub use stratum_core;
pub use stratum_data;

pub use stratum_core::{init_tracing, StratumConfig};
pub use stratum_data::fields;

#[cfg(feature = "memory")]
pub use stratum_data_memory;

#[cfg(feature = "sqlx")]
pub use stratum_data_sqlx;

/// Unified prelude: `use stratum::prelude::*`.
pub mod prelude {
    pub use stratum_core::{init_tracing, StratumConfig};
    pub use stratum_data::prelude::*;

    #[cfg(feature = "memory")]
    pub use stratum_data_memory::{MemoryAdapter, MemoryConnectionHandler, MemoryStore};

    #[cfg(feature = "sqlx")]
    pub use stratum_data_sqlx::prelude::*;
}

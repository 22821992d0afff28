//! In-memory backend for `stratum-data`.
//!
//! Records are stored as field maps in per-schema tables inside a
//! [`MemoryStore`]. Intended for tests, prototypes and as the reference
//! implementation of the [`Adapter`](stratum_data::Adapter) contract.

mod adapter;
mod handler;
mod store;

pub use adapter::MemoryAdapter;
pub use handler::MemoryConnectionHandler;
pub use store::{MemoryStore, MemoryTable};

//! Ambient runtime pieces shared by the Stratum crates: layered YAML
//! configuration and `tracing` subscriber setup.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigValue, FromConfigValue, StratumConfig};
pub use logging::init_tracing;

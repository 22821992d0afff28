mod loader;
pub mod secrets;
pub mod value;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

pub use secrets::{resolve_placeholders, DefaultSecretResolver, SecretResolver};
pub use value::{ConfigValue, FromConfigValue};

/// Environment variable selecting the active profile.
pub const PROFILE_ENV: &str = "STRATUM_PROFILE";

/// Profile used when neither the environment nor the caller picks one.
pub const DEFAULT_PROFILE: &str = "dev";

/// Pool size of a binding that does not set `max_connections`.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const BINDINGS_PREFIX: &str = "stratum.bindings";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Connection settings of one named binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    pub name: String,
    pub url: String,
    pub max_connections: u32,
}

/// Configuration loaded from YAML files, `.env` files and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `stratum.yaml` (base)
/// 2. `stratum-{profile}.yaml` (profile override)
/// 3. `.env` and `.env.{profile}` (loaded into the process environment,
///    never overwriting variables that are already set)
/// 4. `${...}` placeholders in string values, see [`DefaultSecretResolver`]
/// 5. `STRATUM_*` environment variables (`STRATUM_BINDINGS_DEFAULT_URL`
///    overrides `stratum.bindings.default.url`)
///
/// The profile comes from `STRATUM_PROFILE`, then the argument, then `"dev"`.
///
/// ```yaml
/// stratum:
///   bindings:
///     default:
///       url: "sqlite://app.db"
///       max_connections: 8
///     archive:
///       url: "${ARCHIVE_DATABASE_URL}"
/// ```
#[derive(Debug, Clone)]
pub struct StratumConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl StratumConfig {
    /// Load configuration from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from_dir(".", profile)
    }

    /// Load configuration from the YAML and `.env` files in `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>, profile: &str) -> Result<Self, ConfigError> {
        Self::load_with_resolver(dir, profile, &DefaultSecretResolver)
    }

    /// Load configuration from `dir`, resolving placeholders through `resolver`.
    pub fn load_with_resolver(
        dir: impl AsRef<Path>,
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let active_profile = std::env::var(PROFILE_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| {
                if profile.is_empty() {
                    DEFAULT_PROFILE.to_string()
                } else {
                    profile.to_string()
                }
            });

        let mut values = HashMap::new();

        loader::load_yaml_file(&dir.join("stratum.yaml"), &mut values)?;
        loader::load_yaml_file(
            &dir.join(format!("stratum-{active_profile}.yaml")),
            &mut values,
        )?;

        // Missing .env files are fine.
        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        resolve_string_values(&mut values, resolver)?;
        loader::overlay_env(std::env::vars(), &mut values);

        tracing::debug!(profile = %active_profile, keys = values.len(), "Configuration loaded");
        Ok(StratumConfig {
            values,
            profile: active_profile,
        })
    }

    /// Build a config from a YAML string. No files or environment are read.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(StratumConfig {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        StratumConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Get a typed value for the given dot-separated key.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning `default` if the key is missing or unconvertible.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Names declared under `stratum.bindings`, sorted.
    pub fn binding_names(&self) -> Vec<String> {
        let prefix = format!("{BINDINGS_PREFIX}.");
        self.values
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('.').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Settings of the binding `name`.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotFound` when the binding has no `url`.
    pub fn binding(&self, name: &str) -> Result<BindingConfig, ConfigError> {
        let url = self.get::<String>(&format!("{BINDINGS_PREFIX}.{name}.url"))?;
        let max_connections_key = format!("{BINDINGS_PREFIX}.{name}.max_connections");
        let max_connections = match self.values.get(&max_connections_key) {
            Some(_) => self.get::<u32>(&max_connections_key)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(BindingConfig {
            name: name.to_string(),
            url,
            max_connections,
        })
    }
}

/// Resolve `${...}` placeholders in all string values of the config map.
fn resolve_string_values(
    values: &mut HashMap<String, ConfigValue>,
    resolver: &dyn SecretResolver,
) -> Result<(), ConfigError> {
    for value in values.values_mut() {
        if let ConfigValue::String(s) = value {
            if s.contains("${") {
                *s = resolve_placeholders(s, resolver)?;
            }
        }
    }
    Ok(())
}

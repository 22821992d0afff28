use std::collections::HashMap;
use std::path::Path;

use super::value::{yaml_key, ConfigValue};
use super::ConfigError;

/// Load and flatten a YAML file into `values`. A missing file is not an error.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<bool, ConfigError> {
    if !path.exists() {
        tracing::trace!(path = %path.display(), "Config file absent, skipping");
        return Ok(false);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    load_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(true)
}

/// Parse a YAML string and flatten it into `values`.
pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys.
///
/// Mappings are stored both as a whole under their own key and leaf by leaf,
/// so `stratum.bindings` can be enumerated while `stratum.bindings.default.url`
/// stays directly addressable. Sequences are stored whole and by index.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(value));
            }
            for (k, v) in map {
                let key = yaml_key(k);
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(value));
                for (i, item) in seq.iter().enumerate() {
                    flatten_yaml(&format!("{prefix}.{i}"), item, out);
                }
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}

/// Environment variable name for a config key: `stratum.bindings.default.url`
/// becomes `STRATUM_BINDINGS_DEFAULT_URL`.
pub(crate) fn env_key(config_key: &str) -> String {
    config_key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Settings a binding section understands.
const BINDING_KEYS: &[&str] = &["url", "max_connections"];

/// Config key for a `STRATUM_BINDINGS_<NAME>_<SETTING>` variable, where
/// `<SETTING>` is one of [`BINDING_KEYS`]. The binding name keeps its
/// underscores (`READ_REPLICA` becomes `read_replica`).
fn binding_key(env_name: &str) -> Option<String> {
    let rest = env_name.strip_prefix(&format!("{}_", env_key(super::BINDINGS_PREFIX)))?;
    BINDING_KEYS.iter().find_map(|setting| {
        let name = rest.strip_suffix(&format!("_{}", env_key(setting)))?;
        (!name.is_empty())
            .then(|| format!("{}.{}.{setting}", super::BINDINGS_PREFIX, name.to_lowercase()))
    })
}

/// Overlay `STRATUM_*` environment variables onto `values`.
///
/// A variable replaces the existing key whose [`env_key`] it equals, which
/// keeps underscores inside key segments (`max_connections`) intact. Binding
/// settings are recognised by name next. Other variables are added with
/// underscores read as dots.
pub(crate) fn overlay_env<I>(vars: I, values: &mut HashMap<String, ConfigValue>)
where
    I: IntoIterator<Item = (String, String)>,
{
    let by_env: HashMap<String, String> = values
        .keys()
        .map(|k| (env_key(k), k.clone()))
        .collect();

    for (name, value) in vars {
        if !name.starts_with("STRATUM_") || name == super::PROFILE_ENV {
            continue;
        }
        let key = by_env
            .get(&name)
            .cloned()
            .or_else(|| binding_key(&name))
            .unwrap_or_else(|| name.to_lowercase().replace('_', "."));
        tracing::trace!(env = %name, key = %key, "Config key overridden from environment");
        values.insert(key, ConfigValue::String(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_uppercases_and_replaces_separators() {
        assert_eq!(env_key("stratum.bindings.default.url"), "STRATUM_BINDINGS_DEFAULT_URL");
        assert_eq!(
            env_key("stratum.bindings.archive.max_connections"),
            "STRATUM_BINDINGS_ARCHIVE_MAX_CONNECTIONS"
        );
    }

    #[test]
    fn overlay_matches_existing_keys_first() {
        let mut values = HashMap::new();
        values.insert(
            "stratum.bindings.default.max_connections".to_string(),
            ConfigValue::Integer(5),
        );
        overlay_env(
            [
                ("STRATUM_BINDINGS_DEFAULT_MAX_CONNECTIONS".to_string(), "9".to_string()),
                ("STRATUM_BINDINGS_REPLICA_URL".to_string(), "sqlite://r.db".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ],
            &mut values,
        );

        assert_eq!(
            values["stratum.bindings.default.max_connections"],
            ConfigValue::from("9")
        );
        assert_eq!(
            values["stratum.bindings.replica.url"],
            ConfigValue::from("sqlite://r.db")
        );
        assert!(!values.contains_key("home"));
    }

    #[test]
    fn binding_settings_keep_underscores_without_yaml() {
        let mut values = HashMap::new();
        overlay_env(
            [
                ("STRATUM_BINDINGS_REPLICA_MAX_CONNECTIONS".to_string(), "12".to_string()),
                ("STRATUM_BINDINGS_READ_REPLICA_URL".to_string(), "sqlite://rr.db".to_string()),
                ("STRATUM_BINDINGS_URL".to_string(), "x".to_string()),
            ],
            &mut values,
        );

        assert_eq!(
            values["stratum.bindings.replica.max_connections"],
            ConfigValue::from("12")
        );
        assert_eq!(
            values["stratum.bindings.read_replica.url"],
            ConfigValue::from("sqlite://rr.db")
        );
        assert!(values.contains_key("stratum.bindings.url"));
        assert!(!values.contains_key("stratum.bindings.replica.max.connections"));
    }

    #[test]
    fn mappings_are_kept_whole_and_flattened() {
        let mut values = HashMap::new();
        load_yaml_str("a:\n  b:\n    c: 1\n", &mut values).unwrap();
        assert_eq!(values["a.b.c"], ConfigValue::Integer(1));
        assert!(matches!(values["a.b"], ConfigValue::Map(_)));
        assert!(matches!(values["a"], ConfigValue::Map(_)));
    }
}

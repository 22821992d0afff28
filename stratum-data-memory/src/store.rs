use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use stratum_data::FieldMap;

/// Rows of one schema, in insertion order, plus its identifier counter.
#[derive(Debug, Default, Clone)]
pub struct MemoryTable {
    pub rows: Vec<FieldMap>,
    last_id: i64,
}

impl MemoryTable {
    /// Next auto-assigned identifier. Starts at 1.
    pub fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Keep the counter ahead of explicitly supplied integer identifiers.
    pub fn observe_id(&mut self, id: &Value) {
        if let Some(id) = id.as_i64() {
            self.last_id = self.last_id.max(id);
        }
    }

    pub fn position(&self, id_field: &str, id: &Value) -> Option<usize> {
        self.rows.iter().position(|r| r.get(id_field) == Some(id))
    }
}

/// Shared, thread-safe set of tables keyed by schema name.
///
/// Cloning is cheap and every clone sees the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<DashMap<String, MemoryTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with shared access to the table `schema`, if it exists.
    pub fn read<R>(&self, schema: &str, f: impl FnOnce(&MemoryTable) -> R) -> Option<R> {
        self.tables.get(schema).map(|table| f(table.value()))
    }

    /// Run `f` with exclusive access to the table `schema`, creating it on first use.
    pub fn write<R>(&self, schema: &str, f: impl FnOnce(&mut MemoryTable) -> R) -> R {
        let mut table = self.tables.entry(schema.to_string()).or_default();
        f(table.value_mut())
    }

    pub fn len(&self, schema: &str) -> usize {
        self.read(schema, |t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, schema: &str) -> bool {
        self.len(schema) == 0
    }

    pub fn schema_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }

    /// Drop every table.
    pub fn clear(&self) {
        self.tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_start_at_one_and_skip_explicit_ones() {
        let mut table = MemoryTable::default();
        assert_eq!(table.next_id(), 1);
        table.observe_id(&json!(10));
        assert_eq!(table.next_id(), 11);
        table.observe_id(&json!("not-a-number"));
        assert_eq!(table.next_id(), 12);
    }

    #[test]
    fn clones_share_tables() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.write("role", |t| t.rows.push(FieldMap::new()));
        assert_eq!(other.len("role"), 1);
        assert!(other.is_empty("account"));
        assert_eq!(other.schema_names(), ["role"]);

        other.clear();
        assert!(store.is_empty("role"));
    }
}

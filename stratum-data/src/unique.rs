//! Application-level unique constraints.
//!
//! The store is not trusted to enforce uniqueness, so every create and update
//! first checks each unique field on its own against existing records. Only
//! the first conflicting field is reported, in declaration order. A unique
//! constraint spanning several fields cannot be expressed here.

use crate::entity::{is_empty_value, Entity, FieldMap};
use serde_json::Value;

/// Which write a unique check guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// Lookups to run before a write.
///
/// Each entry of `checks` is tested on its own, together with every pair in
/// `excludes`.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueChecks {
    pub checks: Vec<(&'static str, Value)>,
    pub excludes: FieldMap,
}

impl UniqueChecks {
    pub fn for_entity<E: Entity>(entity: &E, mode: WriteMode) -> Self {
        let mut checks = Vec::new();
        let mut excludes = FieldMap::new();

        for field in E::meta().unique_fields() {
            let value = entity.value(field.name);
            if is_empty_value(&value) {
                continue;
            }
            // On update the entity's own row must not count as a conflict.
            if mode == WriteMode::Update && field.identifier {
                excludes.insert(field.name.to_string(), value);
                continue;
            }
            checks.push((field.name, value));
        }

        Self { checks, excludes }
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Single-field filter maps, one per check, in declaration order.
    pub fn filters(&self) -> impl Iterator<Item = (&'static str, FieldMap)> + '_ {
        self.checks.iter().map(|(field, value)| {
            let mut filter = FieldMap::new();
            filter.insert(field.to_string(), value.clone());
            (*field, filter)
        })
    }
}

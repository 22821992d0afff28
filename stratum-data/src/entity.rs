use crate::error::{DataError, ValidationError, REQUIRED_MESSAGE};
use serde_json::Value;

/// Field name to value mapping used for entity construction, partial updates,
/// query filters and document-style records.
pub type FieldMap = serde_json::Map<String, Value>;

/// Static description of one declared entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub identifier: bool,
    pub unique: bool,
    pub required: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            identifier: false,
            unique: false,
            required: false,
        }
    }

    /// Mark this field as the entity identifier.
    pub const fn identifier(self) -> Self {
        Self {
            identifier: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Identifier fields are always unique.
    pub const fn is_unique(&self) -> bool {
        self.unique || self.identifier
    }
}

/// Field declarations of an entity type, in declaration order.
///
/// # Example
///
/// ```ignore
/// static ROLE: EntityMeta = EntityMeta {
///     name: "Role",
///     fields: &[
///         FieldDescriptor::new("id").identifier(),
///         FieldDescriptor::new("name").unique().required(),
///     ],
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EntityMeta {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl EntityMeta {
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn identifier(&self) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.identifier)
    }

    /// Unique fields in declaration order, identifier included.
    pub fn unique_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_unique())
    }

    /// Check that these declarations describe a usable entity: at least one
    /// field, exactly one identifier, no empty or repeated names.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.fields.is_empty() {
            return Err(DataError::Configuration(format!(
                "entity `{}` declares no fields",
                self.name
            )));
        }
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(DataError::Configuration(format!(
                    "entity `{}` declares a field with an empty name",
                    self.name
                )));
            }
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(DataError::Configuration(format!(
                    "entity `{}` declares field `{}` twice",
                    self.name, field.name
                )));
            }
        }
        match self.fields.iter().filter(|f| f.identifier).count() {
            1 => Ok(()),
            0 => Err(DataError::Configuration(format!(
                "entity `{}` has no identifier field",
                self.name
            ))),
            n => Err(DataError::Configuration(format!(
                "entity `{}` has {n} identifier fields, expected exactly one",
                self.name
            ))),
        }
    }
}

/// Values treated as "not set": `null`, `""`, `[]` and `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Report every required field of `meta` that is missing or empty in `data`.
pub fn check_required(meta: &EntityMeta, data: &FieldMap) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    for field in meta.fields.iter().filter(|f| f.required) {
        if data.get(field.name).map_or(true, is_empty_value) {
            err.add(field.name, REQUIRED_MESSAGE);
        }
    }
    err.into_result()
}

/// A domain object with identity, persisted through a [`Schema`](crate::Schema).
///
/// Implementors own field-level validation: [`build`](Entity::build) must
/// reject bad input with a field-keyed [`ValidationError`].
pub trait Entity: Clone + Send + Sync + 'static {
    fn meta() -> &'static EntityMeta;

    /// Construct and validate an instance from raw field values.
    fn build(data: FieldMap) -> Result<Self, ValidationError>;

    /// Current value of a declared field; `Value::Null` when unset or unknown.
    fn value(&self, field: &str) -> Value;

    /// Apply a partial update. Fields absent from `data` keep their value.
    ///
    /// The default rebuilds the entity from its merged fields, so the same
    /// validation as [`build`](Entity::build) applies.
    fn update(&mut self, data: &FieldMap) -> Result<(), ValidationError> {
        let mut fields = self.to_fields();
        for (key, value) in data {
            fields.insert(key.clone(), value.clone());
        }
        *self = Self::build(fields)?;
        Ok(())
    }

    fn identifier(&self) -> Value {
        match Self::meta().identifier() {
            Some(field) => self.value(field.name),
            None => Value::Null,
        }
    }

    /// All declared fields with their current values.
    fn to_fields(&self) -> FieldMap {
        Self::meta()
            .fields
            .iter()
            .map(|f| (f.name.to_string(), self.value(f.name)))
            .collect()
    }
}

use std::collections::BTreeMap;

/// Message attached to a field whose value collides with a stored record.
pub const UNIQUE_MESSAGE: &str = "is already in use";

/// Message attached to a required field that was left empty.
pub const REQUIRED_MESSAGE: &str = "is required";

/// Message attached to an identifier that an update tried to change.
pub const IMMUTABLE_MESSAGE: &str = "cannot be changed";

/// Field-keyed validation failure.
///
/// Produced both by entity construction (field-level type and requiredness
/// checks) and by the repository's unique-constraint validation, so callers
/// handle the two uniformly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    schema: Option<String>,
    messages: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error carrying a single message for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(field, message);
        err
    }

    /// Append a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Attribute the error to a schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Schema the error was raised for, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn messages(&self) -> &BTreeMap<String, Vec<String>> {
        &self.messages
    }

    pub fn into_messages(self) -> BTreeMap<String, Vec<String>> {
        self.messages
    }

    /// Messages recorded for a single field.
    pub fn field_messages(&self, field: &str) -> Option<&[String]> {
        self.messages.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `Ok(())` when nothing was recorded, the error itself otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "Validation failed for {schema}")?,
            None => write!(f, "Validation failed")?,
        }
        let mut sep = ": ";
        for (field, messages) in &self.messages {
            write!(f, "{sep}{field} {}", messages.join(", "))?;
            sep = "; ";
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// Invalid schema or registry setup. Raised at registration time and never retried.
    Configuration(String),
    NotFound(String),
    Validation(ValidationError),
    /// Backend failure, passed through untranslated.
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `stratum-data-sqlx`) to wrap
    /// driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }

    /// The validation payload, when this is a `Validation` error.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            DataError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Validation(err) => write!(f, "{err}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            DataError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DataError {
    fn from(err: ValidationError) -> Self {
        DataError::Validation(err)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Other(err.to_string())
    }
}

use crate::query::QueryError;
use stratum_data::DataError;

/// Extension trait for converting `sqlx::Error` into `DataError`.
///
/// Orphan rules rule out `From<sqlx::Error> for DataError` here; use
/// `.into_data_error()` instead.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".into()),
            _ => DataError::database(self),
        }
    }
}

impl SqlxErrorExt for QueryError {
    fn into_data_error(self) -> DataError {
        DataError::Configuration(self.to_string())
    }
}

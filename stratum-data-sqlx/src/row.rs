use crate::error::SqlxErrorExt;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use stratum_data::{DataError, FieldMap};

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind a dynamic value by its JSON kind. Arrays and objects are stored as JSON text.
pub(crate) fn bind_value(query: SqliteQuery<'_>, value: Value) -> SqliteQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s),
        other @ (Value::Array(_) | Value::Object(_)) => query.bind(other.to_string()),
    }
}

pub(crate) fn bind_all(mut query: SqliteQuery<'_>, params: Vec<Value>) -> SqliteQuery<'_> {
    for value in params {
        query = bind_value(query, value);
    }
    query
}

/// Decode every column of `row` by its SQLite storage class.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<FieldMap, DataError> {
    let mut record = FieldMap::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let type_name = {
            let raw = row.try_get_raw(idx).map_err(SqlxErrorExt::into_data_error)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };
        let value = match type_name {
            None => Value::Null,
            Some(type_name) => decode_column(row, idx, &type_name)?,
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &SqliteRow, idx: usize, type_name: &str) -> Result<Value, DataError> {
    let value = match type_name {
        "NULL" => Ok(Value::Null),
        "INTEGER" | "BIGINT" | "INT8" => row.try_get::<i64, _>(idx).map(Value::from),
        "BOOLEAN" => row.try_get::<bool, _>(idx).map(Value::from),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(idx).map(Value::from),
        "BLOB" => row.try_get::<Vec<u8>, _>(idx).map(Value::from),
        // TEXT and the date/time affinities
        _ => row.try_get::<String, _>(idx).map(Value::from),
    };
    value.map_err(SqlxErrorExt::into_data_error)
}

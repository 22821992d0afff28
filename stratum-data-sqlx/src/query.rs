//! SQL text generation for the adapter primitives.
//!
//! Statements target SQLite. Every table and column name passes identifier
//! validation and is double-quoted; values are always bound, never inlined.

use serde_json::Value;
use stratum_data::{OrderBy, Query};

const PLACEHOLDER: &str = "?";
const QUOTE: char = '"';
/// Equality that treats two NULLs as equal.
const NULL_SAFE_EQ: &str = "IS";

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(String, Value),
    IsNull(String),
    /// Holds unless every pair matches (null-safe).
    NotAll(Vec<(String, Value)>),
}

/// Fluent builder for the statements a table-per-schema adapter needs.
///
/// # Example
///
/// ```ignore
/// let (sql, params) = QueryBuilder::new("role")
///     .where_eq("created_by", "john")
///     .order_by("name", false)
///     .limit(10)
///     .build_select(&["*"])?;
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
        }
    }

    /// Builder for the filters, excludes, ordering and page window of `query`.
    pub fn from_query(table: &str, query: &Query) -> Self {
        let mut builder = Self::new(table);
        for (field, value) in &query.filters {
            builder = builder.where_eq(field, value.clone());
        }
        if !query.excludes.is_empty() {
            builder = builder.where_not_all(
                query
                    .excludes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            );
        }
        builder
            .order_by_keys(&query.order_by)
            .limit(query.per_page)
            .offset(query.offset())
    }

    /// `column = ?`, or `column IS NULL` for a null value.
    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        let cond = if value.is_null() {
            Condition::IsNull(column.to_string())
        } else {
            Condition::Eq(column.to_string(), value)
        };
        self.conditions.push(cond);
        self
    }

    /// `NOT (a IS ? AND b IS ?)`: rows matching every pair are left out.
    pub fn where_not_all(mut self, pairs: Vec<(String, Value)>) -> Self {
        if !pairs.is_empty() {
            self.conditions.push(Condition::NotAll(pairs));
        }
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn order_by_keys(mut self, order_by: &OrderBy) -> Self {
        for key in order_by.keys() {
            self.order.push((key.field, !key.descending));
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// `SELECT <columns> FROM <table> [WHERE] [ORDER BY] [LIMIT] [OFFSET]`.
    pub fn build_select(&self, columns: &[&str]) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.table()?;
        let columns = self.column_list(columns)?;

        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        self.append_order(&mut sql)?;
        self.append_limit_offset(&mut sql);
        Ok((sql, params))
    }

    /// `SELECT COUNT(*)` over the same conditions; ordering and paging are ignored.
    pub fn build_count(&self) -> Result<(String, Vec<Value>), QueryError> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table()?);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// `SELECT 1 ... LIMIT 1` over the same conditions.
    pub fn build_exists(&self) -> Result<(String, Vec<Value>), QueryError> {
        let mut sql = format!("SELECT 1 FROM {}", self.table()?);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        sql.push_str(" LIMIT 1");
        Ok((sql, params))
    }

    /// `INSERT INTO <table> (cols) VALUES (...)`. Conditions are ignored.
    pub fn build_insert(&self, values: &[(&str, Value)]) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.table()?;
        if values.is_empty() {
            return Ok((format!("INSERT INTO {table} DEFAULT VALUES"), Vec::new()));
        }
        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (column, _) in values {
            columns.push(self.identifier(column, "column")?);
            placeholders.push(PLACEHOLDER);
        }
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, values.iter().map(|(_, v)| v.clone()).collect()))
    }

    /// `UPDATE <table> SET a = ?, ... [WHERE]`.
    pub fn build_update(&self, values: &[(&str, Value)]) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.table()?;
        let mut params = Vec::with_capacity(values.len());
        let mut assignments = Vec::with_capacity(values.len());
        for (column, value) in values {
            let column = self.identifier(column, "column")?;
            assignments.push(format!("{column} = {PLACEHOLDER}"));
            params.push(value.clone());
        }
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// `DELETE FROM <table> [WHERE]`.
    pub fn build_delete(&self) -> Result<(String, Vec<Value>), QueryError> {
        let mut sql = format!("DELETE FROM {}", self.table()?);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn table(&self) -> Result<String, QueryError> {
        self.identifier(&self.table, "table")
    }

    fn append_where(&self, sql: &mut String, params: &mut Vec<Value>) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.conditions.len());
        for cond in &self.conditions {
            let clause = match cond {
                Condition::Eq(col, val) => {
                    let col = self.identifier(col, "column")?;
                    params.push(val.clone());
                    format!("{col} = {PLACEHOLDER}")
                }
                Condition::IsNull(col) => {
                    format!("{} IS NULL", self.identifier(col, "column")?)
                }
                Condition::NotAll(pairs) => {
                    let mut parts = Vec::with_capacity(pairs.len());
                    for (col, val) in pairs {
                        let col = self.identifier(col, "column")?;
                        params.push(val.clone());
                        parts.push(format!("{col} {NULL_SAFE_EQ} {PLACEHOLDER}"));
                    }
                    format!("NOT ({})", parts.join(" AND "))
                }
            };
            clauses.push(clause);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.identifier(col, "column")?;
            clauses.push(format!("{col} {}", if *asc { "ASC" } else { "DESC" }));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, sql: &mut String) {
        if let Some(limit) = self.limit_val {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset_val.filter(|o| *o > 0) {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn column_list(&self, columns: &[&str]) -> Result<String, QueryError> {
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            if *col == "*" {
                out.push("*".to_string());
            } else {
                out.push(self.identifier(col, "column")?);
            }
        }
        Ok(out.join(", "))
    }

    fn identifier(&self, ident: &str, kind: &'static str) -> Result<String, QueryError> {
        if !is_valid_identifier(ident) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        Ok(format!("{QUOTE}{ident}{QUOTE}"))
    }
}

#[derive(Debug, Clone)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

use crate::entity::FieldMap;
use serde_json::Value;
use std::cmp::Ordering;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// One ordering key. Written as `"name"` (ascending) or `"-name"` (descending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub descending: bool,
}

impl OrderKey {
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: key.to_string(),
                descending: false,
            },
        }
    }
}

/// Ordered list of ordering keys.
///
/// A scalar key converts into a single-element list, so `"name"` and
/// `["name"]` describe the same ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy(Vec<String>);

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn keys(&self) -> impl Iterator<Item = OrderKey> + '_ {
        self.0.iter().map(|k| OrderKey::parse(k))
    }

    /// Compare two documents key by key; missing fields sort as `null`.
    pub fn compare(&self, a: &FieldMap, b: &FieldMap) -> Ordering {
        for key in self.keys() {
            let left = a.get(&key.field).unwrap_or(&Value::Null);
            let right = b.get(&key.field).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl From<&str> for OrderBy {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for OrderBy {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<Vec<String>> for OrderBy {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

impl From<Vec<&str>> for OrderBy {
    fn from(keys: Vec<&str>) -> Self {
        Self(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OrderBy {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OrderBy {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

/// Total order over JSON values: `null < bool < number < string < array < object`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Arguments of a paged, filtered, ordered lookup.
///
/// Filters are ANDed equality matches. A record is excluded when it matches
/// every pair in `excludes`.
///
/// # Example
///
/// ```ignore
/// let query = Query::new()
///     .page(2)
///     .per_page(25)
///     .order_by("-created_on")
///     .filter("status", "active")
///     .exclude("id", 42);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub page: u64,
    pub per_page: u64,
    pub order_by: OrderBy,
    pub excludes: FieldMap,
    pub filters: FieldMap,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            order_by: OrderBy::default(),
            excludes: FieldMap::new(),
            filters: FieldMap::new(),
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<OrderBy>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn filters(mut self, filters: FieldMap) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn exclude(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.excludes.insert(field.into(), value.into());
        self
    }

    pub fn excludes(mut self, excludes: FieldMap) -> Self {
        self.excludes.extend(excludes);
        self
    }

    /// Number of records to skip for the current page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Clamp `page` and `per_page` to at least 1.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.per_page = self.per_page.max(1);
        self
    }

    /// Evaluate filters and excludes against a document-shaped record.
    pub fn matches(&self, record: &FieldMap) -> bool {
        let field_eq = |(field, value): (&String, &Value)| {
            record.get(field).unwrap_or(&Value::Null) == value
        };
        if !self.filters.iter().all(field_eq) {
            return false;
        }
        self.excludes.is_empty() || !self.excludes.iter().all(field_eq)
    }

    /// Filter, order and slice documents in memory, returning the page and
    /// the number of matches before slicing.
    pub fn apply<'a, I>(&self, records: I) -> (Vec<&'a FieldMap>, u64)
    where
        I: IntoIterator<Item = &'a FieldMap>,
    {
        let mut matched: Vec<&FieldMap> = records.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| self.order_by.compare(a, b));
        let total = matched.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let per_page = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        let page = matched.into_iter().skip(offset).take(per_page).collect();
        (page, total)
    }
}

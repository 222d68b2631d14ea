//! Raw and normalized pagination queries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::sort::{RequestedSort, Sort};

/// Normalized pagination state, echoed back to clients as `meta`.
///
/// `offset` and `total_pages` are always derived by the normalizer and never
/// taken from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginateQuery {
    /// 1-based page number
    pub current_page: u64,
    /// Items per page. When unpaged this is `total_items`, so an empty
    /// unpaged collection reports `0`.
    pub size: u64,
    /// `(current_page - 1) * size`
    pub offset: u64,
    pub unpaged: bool,
    pub total_pages: u64,
    pub total_items: u64,
    pub sort_by: Vec<Sort>,
    /// Base path links are built from
    pub path: String,
}

/// [`PaginateQuery`] plus the page-size cap in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPaginateQuery {
    #[serde(flatten)]
    pub query: PaginateQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Keys that only ever come out of the normalizer. Requests carrying them
/// have them discarded instead of being treated as filters.
const DERIVED_KEYS: [&str; 3] = ["offset", "totalPages", "totalItems"];

/// Untrusted pagination input as it arrives from a request.
///
/// Every field is optional and stringly typed; the normalizer decides what
/// each value means. Keys that are not pagination parameters are kept in
/// `filters` for the ORM filter layer and are otherwise opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDataQuery")]
pub struct PaginateDataQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub limit: Option<String>,
    pub unpaged: Option<String>,
    pub path: Option<String>,
    pub sort_by: Vec<RequestedSort>,
    pub filters: BTreeMap<String, Vec<String>>,
}

impl PaginateDataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a query from decoded URL query pairs, preserving order.
    ///
    /// Scalar keys keep their last occurrence; `sortBy` accumulates across
    /// repeated keys and comma-separated values.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "page" | "currentPage" => query.page = Some(value),
                "size" => query.size = Some(value),
                "limit" => query.limit = Some(value),
                "unpaged" => query.unpaged = Some(value),
                "path" => query.path = Some(value),
                "sortBy" | "sort_by" => query.sort_by.extend(RequestedSort::parse_list(&value)),
                key if DERIVED_KEYS.contains(&key) => {}
                key => query.filters.entry(key.to_string()).or_default().push(value),
            }
        }
        query
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_page(mut self, page: impl ToString) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn with_size(mut self, size: impl ToString) -> Self {
        self.size = Some(size.to_string());
        self
    }

    pub fn with_unpaged(mut self, unpaged: bool) -> Self {
        self.unpaged = Some(unpaged.to_string());
        self
    }

    pub fn with_sort(mut self, token: &str) -> Self {
        self.sort_by.extend(RequestedSort::parse_list(token));
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataQuery {
    #[serde(default)]
    page: Option<Value>,
    /// Same as `page`, under the name it has in `meta`
    #[serde(default)]
    current_page: Option<Value>,
    #[serde(default)]
    size: Option<Value>,
    #[serde(default)]
    limit: Option<Value>,
    #[serde(default)]
    unpaged: Option<Value>,
    #[serde(default)]
    path: Option<Value>,
    #[serde(default, alias = "sort_by")]
    sort_by: Option<Value>,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

impl From<RawDataQuery> for PaginateDataQuery {
    fn from(raw: RawDataQuery) -> Self {
        let filters = raw
            .rest
            .into_iter()
            .filter(|(key, _)| !DERIVED_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                let values = filter_values(value);
                (!values.is_empty()).then_some((key, values))
            })
            .collect();

        Self {
            page: raw
                .page
                .and_then(scalar)
                .or_else(|| raw.current_page.and_then(scalar)),
            size: raw.size.and_then(scalar),
            limit: raw.limit.and_then(scalar),
            unpaged: raw.unpaged.and_then(scalar),
            path: raw.path.and_then(scalar),
            sort_by: raw.sort_by.map(requested_sorts).unwrap_or_default(),
            filters,
        }
    }
}

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn filter_values(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    }
}

fn requested_sorts(value: Value) -> Vec<RequestedSort> {
    match value {
        Value::String(s) => RequestedSort::parse_list(&s),
        Value::Array(items) => items
            .into_iter()
            .flat_map(|item| match item {
                Value::String(s) => RequestedSort::parse_list(&s),
                obj @ Value::Object(_) => serde_json::from_value::<RequestedSort>(obj)
                    .map(|sort| vec![sort])
                    .unwrap_or_default(),
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

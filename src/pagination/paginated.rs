use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::links::Links;
use super::query::PaginateQuery;

/// Paginated response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    /// Items on the current page, in query order
    pub data: Vec<T>,
    /// Normalized query the page was produced from
    pub meta: PaginateQuery,
    pub links: Links,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, meta: PaginateQuery, links: Links) -> Self {
        Self { data, meta, links }
    }

    /// Converts the items, keeping `meta` and `links`.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
            links: self.links,
        }
    }
}

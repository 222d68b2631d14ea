//! HATEOAS navigation links
//!
//! Links always carry normalized values, so following one yields an
//! in-range request. `first` and `last` are always present; `last` points at
//! page 1 for an empty collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::query::PaginateQuery;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub current: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

impl Links {
    pub fn build(query: &PaginateQuery, filters: &BTreeMap<String, Vec<String>>) -> Self {
        let builder = LinkBuilder { query, filters };
        let last_page = query.total_pages.max(1);

        Links {
            first: Some(builder.page(1)),
            previous: (query.current_page > 1)
                .then(|| builder.page((query.current_page - 1).min(last_page))),
            current: builder.page(query.current_page),
            next: (query.current_page < query.total_pages)
                .then(|| builder.page(query.current_page + 1)),
            last: Some(builder.page(last_page)),
        }
    }
}

struct LinkBuilder<'a> {
    query: &'a PaginateQuery,
    filters: &'a BTreeMap<String, Vec<String>>,
}

impl LinkBuilder<'_> {
    fn page(&self, page: u64) -> String {
        let mut params: Vec<(String, String)> = Vec::new();

        params.push(("page".into(), page.to_string()));
        if self.query.unpaged {
            params.push(("unpaged".into(), "true".into()));
        } else {
            params.push(("size".into(), self.query.size.to_string()));
        }
        for sort in &self.query.sort_by {
            params.push(("sortBy".into(), sort.to_token()));
        }
        for (key, values) in self.filters {
            for value in values {
                params.push((key.clone(), value.clone()));
            }
        }

        let encoded: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), encode_value(v)))
            .collect();

        format!("{}?{}", self.query.path, encoded.join("&"))
    }
}

/// Percent-encodes a value but keeps `:` readable in sort tokens.
fn encode_value(value: &str) -> String {
    value
        .split(':')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Sort;

    fn query(page: u64, size: u64, total_items: u64) -> PaginateQuery {
        let total_pages = total_items.div_ceil(size);
        PaginateQuery {
            current_page: page,
            size,
            offset: (page - 1) * size,
            unpaged: false,
            total_pages,
            total_items,
            sort_by: vec![Sort::desc("views")],
            path: "/api/v1/articles".into(),
        }
    }

    #[test]
    fn middle_page_has_all_links() {
        let links = Links::build(&query(3, 20, 95), &BTreeMap::new());
        assert_eq!(links.current, "/api/v1/articles?page=3&size=20&sortBy=views:desc");
        assert_eq!(links.first.as_deref(), Some("/api/v1/articles?page=1&size=20&sortBy=views:desc"));
        assert_eq!(links.previous.as_deref(), Some("/api/v1/articles?page=2&size=20&sortBy=views:desc"));
        assert_eq!(links.next.as_deref(), Some("/api/v1/articles?page=4&size=20&sortBy=views:desc"));
        assert_eq!(links.last.as_deref(), Some("/api/v1/articles?page=5&size=20&sortBy=views:desc"));
    }

    #[test]
    fn first_page_has_no_previous_and_last_page_no_next() {
        let first = Links::build(&query(1, 20, 95), &BTreeMap::new());
        assert!(first.previous.is_none());
        assert!(first.next.is_some());

        let last = Links::build(&query(5, 20, 95), &BTreeMap::new());
        assert!(last.previous.is_some());
        assert!(last.next.is_none());
    }

    #[test]
    fn page_past_the_end_links_back_to_last_page() {
        let links = Links::build(&query(9, 20, 95), &BTreeMap::new());
        assert_eq!(links.current, "/api/v1/articles?page=9&size=20&sortBy=views:desc");
        assert_eq!(links.previous, links.last);
        assert!(links.next.is_none());

        let empty = Links::build(&query(4, 20, 0), &BTreeMap::new());
        assert_eq!(empty.previous.as_deref(), Some("/api/v1/articles?page=1&size=20&sortBy=views:desc"));
    }

    #[test]
    fn empty_collection_points_last_at_page_one() {
        let links = Links::build(&query(1, 20, 0), &BTreeMap::new());
        assert!(links.next.is_none());
        assert_eq!(links.last, links.first);
    }

    #[test]
    fn filters_are_echoed_encoded() {
        let mut filters = BTreeMap::new();
        filters.insert("q".to_string(), vec!["rust & sql".to_string()]);
        let links = Links::build(&query(1, 10, 5), &filters);
        assert_eq!(
            links.current,
            "/api/v1/articles?page=1&size=10&sortBy=views:desc&q=rust%20%26%20sql"
        );
    }

    #[test]
    fn unpaged_links_drop_size() {
        let mut q = query(1, 95, 95);
        q.unpaged = true;
        q.total_pages = 1;
        q.sort_by.clear();
        let links = Links::build(&q, &BTreeMap::new());
        assert_eq!(links.current, "/api/v1/articles?page=1&unpaged=true");
        assert!(links.next.is_none());
        assert!(links.previous.is_none());
    }

    #[test]
    fn absent_links_are_not_serialized() {
        let links = Links::build(&query(1, 20, 10), &BTreeMap::new());
        let value = serde_json::to_value(&links).unwrap();
        assert!(value.get("previous").is_none());
        assert!(value.get("next").is_none());
        assert!(value.get("current").is_some());
    }
}

//! Request normalization
//!
//! Turns an untrusted [`PaginateDataQuery`] into a bounded [`PaginateQuery`].
//! Bad input never fails: it falls back to defaults. Only the config and
//! options are checked, once, in [`Paginator::new`].

use std::collections::HashSet;

use tracing::debug;
use validator::Validate;

use super::config::PaginateConfig;
use super::links::Links;
use super::options::PaginateOptions;
use super::paginated::Paginated;
use super::query::{ExtendedPaginateQuery, PaginateDataQuery, PaginateQuery};
use super::sort::{is_valid_property, Sort};
use crate::shared::ConfigError;

/// Largest offset handed to the database (signed 64-bit in SQL engines).
/// Also the size cap when neither `max_size` nor `limit` is set.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A validated config + options pair. Build once, share across requests.
#[derive(Debug, Clone)]
pub struct Paginator<F = ()> {
    config: PaginateConfig<F>,
    options: PaginateOptions,
}

impl<F> Paginator<F> {
    pub fn new(mut config: PaginateConfig<F>, options: PaginateOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        config.validate()?;
        Ok(Self { config, options })
    }

    pub fn config(&self) -> &PaginateConfig<F> {
        &self.config
    }

    pub fn options(&self) -> &PaginateOptions {
        &self.options
    }

    pub fn normalize(&self, raw: &PaginateDataQuery, total_items: u64) -> PaginateQuery {
        self.normalize_with(raw, total_items, |_| true)
    }

    /// Like [`Paginator::normalize`], additionally dropping sort properties
    /// rejected by `orderable`. Used when only part of the sortable
    /// properties can be turned into an `ORDER BY`.
    pub fn normalize_with<O>(&self, raw: &PaginateDataQuery, total_items: u64, orderable: O) -> PaginateQuery
    where
        O: Fn(&str) -> bool,
    {
        let sort_by = self.sort_by(raw, orderable);
        let path = raw
            .path
            .as_deref()
            .map(|p| p.split('?').next().unwrap_or_default().to_string())
            .unwrap_or_default();

        let unpaged = self.options.enable_unpaged
            && raw.unpaged.as_deref().and_then(parse_bool).unwrap_or(false);
        if unpaged {
            return PaginateQuery {
                current_page: 1,
                size: total_items,
                offset: 0,
                unpaged: true,
                total_pages: 1,
                total_items,
                sort_by,
                path,
            };
        }

        let size = self.size(raw);
        let max_page = MAX_OFFSET / size + 1;
        let current_page = parse_int(raw.page.as_deref())
            .map(|page| page.max(1) as u64)
            .unwrap_or(1)
            .min(max_page);

        PaginateQuery {
            current_page,
            size,
            offset: (current_page - 1) * size,
            unpaged: false,
            total_pages: total_items.div_ceil(size),
            total_items,
            sort_by,
            path,
        }
    }

    /// Like [`Paginator::normalize`], also reporting the page-size cap.
    pub fn normalize_extended(&self, raw: &PaginateDataQuery, total_items: u64) -> ExtendedPaginateQuery {
        ExtendedPaginateQuery {
            query: self.normalize(raw, total_items),
            limit: self.options.size_cap(),
        }
    }

    pub fn links(&self, query: &PaginateQuery, raw: &PaginateDataQuery) -> Links {
        Links::build(query, &raw.filters)
    }

    /// Wraps an already fetched page.
    pub fn envelope<T>(&self, data: Vec<T>, meta: PaginateQuery, raw: &PaginateDataQuery) -> Paginated<T> {
        let links = self.links(&meta, raw);
        Paginated::new(data, meta, links)
    }

    /// Pages through an in-memory collection that is already in the desired
    /// order.
    pub fn paginate_vec<T>(&self, items: Vec<T>, raw: &PaginateDataQuery) -> Paginated<T> {
        let meta = self.normalize(raw, items.len() as u64);
        let data = if meta.unpaged {
            items
        } else {
            let skip = usize::try_from(meta.offset).unwrap_or(usize::MAX);
            let take = usize::try_from(meta.size).unwrap_or(usize::MAX);
            items.into_iter().skip(skip).take(take).collect()
        };
        self.envelope(data, meta, raw)
    }

    fn size(&self, raw: &PaginateDataQuery) -> u64 {
        let requested = if self.options.enable_size {
            parse_int(raw.size.as_deref()).or_else(|| parse_int(raw.limit.as_deref()))
        } else {
            None
        };

        let size = match requested {
            Some(n) if n < 1 => 1,
            Some(n) => n as u64,
            None => self.options.default_size,
        };

        let cap = self.options.size_cap().unwrap_or(MAX_OFFSET).min(MAX_OFFSET);
        size.clamp(1, cap)
    }

    fn sort_by(&self, raw: &PaginateDataQuery, orderable: impl Fn(&str) -> bool) -> Vec<Sort> {
        if !self.options.enable_sort {
            return self.config.default_sort_by.clone();
        }

        let mut seen = HashSet::new();
        let mut sort_by = Vec::new();
        for requested in &raw.sort_by {
            let property = requested.property.as_str();
            if !is_valid_property(property)
                || !self.config.is_sortable(property)
                || !orderable(property)
            {
                debug!(property, "Dropping sort on non-sortable property");
                continue;
            }
            if !seen.insert(property) {
                continue;
            }
            sort_by.push(Sort {
                property: property.to_string(),
                direction: requested.direction(),
                nulls_first: requested.nulls_first,
            });
        }

        if sort_by.is_empty() {
            self.config.default_sort_by.clone()
        } else {
            sort_by
        }
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

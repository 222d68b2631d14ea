//! Sort descriptors and the `sortBy` token grammar
//!
//! A token is `property[:direction[:nulls]]`, e.g. `name`, `views:desc`,
//! `rating:desc:nullsLast`. Several tokens may share one value, separated
//! by commas.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Lenient parse: anything other than `desc` (any case) is ascending.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized sort entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sort {
    /// Field name, always a member of the configured sortable set
    pub property: String,
    pub direction: SortDirection,
    /// Null ordering. `None` keeps the database default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls_first: Option<bool>,
}

impl Sort {
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
            nulls_first: None,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Desc)
    }

    pub fn with_nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = Some(nulls_first);
        self
    }

    /// Renders the entry back into the token grammar used in links.
    pub fn to_token(&self) -> String {
        match self.nulls_first {
            Some(true) => format!("{}:{}:nullsFirst", self.property, self.direction),
            Some(false) => format!("{}:{}:nullsLast", self.property, self.direction),
            None => format!("{}:{}", self.property, self.direction),
        }
    }
}

/// A sort entry as the client sent it, before any allow-list check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedSort {
    pub property: String,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub nulls_first: Option<bool>,
}

impl RequestedSort {
    /// Parses a single `property[:direction[:nulls]]` token.
    ///
    /// Returns `None` for blank tokens.
    pub fn parse_token(token: &str) -> Option<Self> {
        let mut parts = token.trim().splitn(3, ':');
        let property = parts.next()?.trim();
        if property.is_empty() {
            return None;
        }
        let direction = parts
            .next()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let nulls_first = parts.next().and_then(parse_nulls);

        Some(Self {
            property: property.to_string(),
            direction,
            nulls_first,
        })
    }

    /// Parses a comma-separated list of tokens, skipping blanks.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',').filter_map(Self::parse_token).collect()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
            .as_deref()
            .map(SortDirection::parse_lenient)
            .unwrap_or_default()
    }
}

fn parse_nulls(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "nullsfirst" | "nulls_first" | "first" => Some(true),
        "nullslast" | "nulls_last" | "last" => Some(false),
        _ => None,
    }
}

/// Whether `property` is safe to hand to a query builder as a field path.
pub fn is_valid_property(property: &str) -> bool {
    !property.is_empty()
        && !property.starts_with('.')
        && !property.ends_with('.')
        && !property.contains("..")
        && property
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

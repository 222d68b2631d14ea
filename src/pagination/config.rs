//! Caller-supplied pagination policy
//!
//! `F` is the filter type of the ORM the config is handed to. The core never
//! looks inside it; the SeaORM bridge uses `sea_orm::Condition`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::sort::{is_valid_property, Sort};
use crate::shared::ConfigError;

pub const DEFAULT_ROOT_ALIAS: &str = "e";

/// How a relation is joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RelationType {
    #[default]
    LeftJoin,
    InnerJoin,
    /// Join only the association table of a many-to-many relation
    PivotJoin,
}

/// A relation to join alongside the root entity
#[derive(Debug, Clone, PartialEq)]
pub struct Relation<F> {
    pub property: String,
    pub relation_type: RelationType,
    pub alias: Option<String>,
    /// Also project the joined columns
    pub and_select: bool,
    /// Extra join condition
    pub cond: Option<F>,
    /// Alias of the owner to join from; the root when unset
    pub path: Option<String>,
}

impl<F> Relation<F> {
    pub fn new(property: impl Into<String>, relation_type: RelationType) -> Self {
        Self {
            property: property.into(),
            relation_type,
            alias: None,
            and_select: false,
            cond: None,
            path: None,
        }
    }

    pub fn left_join(property: impl Into<String>) -> Self {
        Self::new(property, RelationType::LeftJoin)
    }

    pub fn inner_join(property: impl Into<String>) -> Self {
        Self::new(property, RelationType::InnerJoin)
    }

    pub fn pivot_join(property: impl Into<String>) -> Self {
        Self::new(property, RelationType::PivotJoin)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn and_select(mut self) -> Self {
        self.and_select = true;
        self
    }

    pub fn cond(mut self, cond: F) -> Self {
        self.cond = Some(cond);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A relation together with the alias it will actually be joined under.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRelation<'a, F> {
    pub relation: &'a Relation<F>,
    pub alias: &'a str,
}

/// Projection: one field or a list of fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    One(String),
    Many(Vec<String>),
}

impl Selection {
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Selection::One(field) => vec![field.as_str()],
            Selection::Many(fields) => fields.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

impl From<&str> for Selection {
    fn from(field: &str) -> Self {
        Selection::One(field.to_string())
    }
}

impl From<Vec<&str>> for Selection {
    fn from(fields: Vec<&str>) -> Self {
        Selection::Many(fields.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Selection {
    fn from(fields: Vec<String>) -> Self {
        Selection::Many(fields)
    }
}

/// Immutable per-resource pagination policy
#[derive(Debug, Clone, PartialEq)]
pub struct PaginateConfig<F = ()> {
    /// Alias of the root entity
    pub alias: String,
    /// Allowed sort properties. `None` allows any well-formed property.
    pub sortable: Option<Vec<String>>,
    pub select: Option<Selection>,
    pub relations: Vec<Relation<F>>,
    /// Base filter applied to every query
    pub where_clause: Option<F>,
    /// Ordering used when the request supplies none (or sorting is disabled)
    pub default_sort_by: Vec<Sort>,
    resolved_aliases: Vec<String>,
}

impl<F> Default for PaginateConfig<F> {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ROOT_ALIAS.to_string(),
            sortable: None,
            select: None,
            relations: Vec::new(),
            where_clause: None,
            default_sort_by: Vec::new(),
            resolved_aliases: Vec::new(),
        }
    }
}

impl<F> PaginateConfig<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn sortable<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.select = Some(selection.into());
        self
    }

    pub fn relation(mut self, relation: Relation<F>) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn relations(mut self, relations: impl IntoIterator<Item = Relation<F>>) -> Self {
        self.relations.extend(relations);
        self
    }

    pub fn where_clause(mut self, filter: F) -> Self {
        self.where_clause = Some(filter);
        self
    }

    pub fn default_sort(mut self, sort: Sort) -> Self {
        self.default_sort_by.push(sort);
        self
    }

    pub fn is_sortable(&self, property: &str) -> bool {
        match &self.sortable {
            Some(allowed) => allowed.iter().any(|p| p == property),
            None => is_valid_property(property),
        }
    }

    /// Relations paired with their effective aliases, in declaration order.
    ///
    /// Only meaningful after [`PaginateConfig::validate`].
    pub fn resolved_relations(&self) -> Vec<ResolvedRelation<'_, F>> {
        self.relations
            .iter()
            .zip(self.resolved_aliases.iter())
            .map(|(relation, alias)| ResolvedRelation {
                relation,
                alias: alias.as_str(),
            })
            .collect()
    }

    /// Checks the config for programmer errors and fixes up relation aliases.
    pub(crate) fn validate(&mut self) -> Result<(), ConfigError> {
        if !is_identifier(&self.alias) {
            return Err(ConfigError::InvalidAlias(self.alias.clone()));
        }

        if let Some(selection) = &self.select {
            let fields = selection.fields();
            if fields.is_empty() {
                return Err(ConfigError::InvalidSelect(String::new()));
            }
            if let Some(bad) = fields.iter().find(|f| !is_valid_property(f)) {
                return Err(ConfigError::InvalidSelect(bad.to_string()));
            }
        }

        if let Some(sortable) = &self.sortable {
            let mut seen = HashSet::new();
            for property in sortable {
                if !is_valid_property(property) {
                    return Err(ConfigError::InvalidSortable(property.clone()));
                }
                if !seen.insert(property.as_str()) {
                    return Err(ConfigError::DuplicateSortable(property.clone()));
                }
                if let Some(selection) = &self.select {
                    if !property.contains('.') && !selection.contains(property) {
                        return Err(ConfigError::SelectConflict(property.clone()));
                    }
                }
            }
        }

        if let Some(sort) = self.default_sort_by.iter().find(|s| !self.is_sortable(&s.property)) {
            return Err(ConfigError::DefaultSortNotSortable(sort.property.clone()));
        }

        for relation in &self.relations {
            if !is_valid_property(&relation.property) {
                return Err(ConfigError::InvalidRelation(format!(
                    "invalid property {:?}",
                    relation.property
                )));
            }
            if let Some(alias) = relation.alias.as_deref().filter(|a| !is_identifier(a)) {
                return Err(ConfigError::InvalidRelation(format!(
                    "invalid alias {:?} for {}",
                    alias, relation.property
                )));
            }
            if let Some(path) = relation.path.as_deref().filter(|p| !is_identifier(p)) {
                return Err(ConfigError::InvalidRelation(format!(
                    "invalid path {:?} for {}",
                    path, relation.property
                )));
            }
        }

        self.resolved_aliases = self.resolve_aliases();
        Ok(())
    }

    fn resolve_aliases(&self) -> Vec<String> {
        let mut taken: HashSet<String> = HashSet::from([self.alias.clone()]);
        let mut resolved = Vec::with_capacity(self.relations.len());

        for relation in &self.relations {
            let wanted = relation
                .alias
                .clone()
                .unwrap_or_else(|| relation.property.replace('.', "_"));
            let mut alias = wanted.clone();
            let mut n = 2;
            while taken.contains(&alias) {
                alias = format!("{}_{}", wanted, n);
                n += 1;
            }
            if alias != wanted {
                warn!(
                    relation = %relation.property,
                    wanted = %wanted,
                    alias = %alias,
                    "Relation alias already in use, renamed"
                );
            }
            taken.insert(alias.clone());
            resolved.push(alias);
        }

        resolved
    }
}

fn is_identifier(s: &str) -> bool {
    is_valid_property(s) && !s.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated(mut config: PaginateConfig) -> Result<PaginateConfig, ConfigError> {
        config.validate().map(|_| config)
    }

    #[test]
    fn unrestricted_config_accepts_well_formed_properties() {
        let config = validated(PaginateConfig::new()).unwrap();
        assert!(config.is_sortable("anything"));
        assert!(config.is_sortable("author.name"));
        assert!(!config.is_sortable("1; drop"));
    }

    #[test]
    fn duplicate_sortable_is_rejected() {
        let err = validated(PaginateConfig::new().sortable(["name", "name"])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSortable(p) if p == "name"));
    }

    #[test]
    fn sortable_outside_select_conflicts() {
        let err = validated(
            PaginateConfig::new()
                .select(vec!["id", "title"])
                .sortable(["title", "views"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SelectConflict(p) if p == "views"));

        // Joined properties are not part of the root projection.
        assert!(validated(
            PaginateConfig::new()
                .select(vec!["id", "title"])
                .sortable(["title", "author.name"]),
        )
        .is_ok());
    }

    #[test]
    fn default_sort_must_be_sortable() {
        let err = validated(
            PaginateConfig::new()
                .sortable(["name"])
                .default_sort(Sort::asc("id")),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DefaultSortNotSortable(p) if p == "id"));
    }

    #[test]
    fn colliding_aliases_are_renamed() {
        let config = validated(
            PaginateConfig::new()
                .with_alias("a")
                .relation(Relation::left_join("author").alias("a"))
                .relation(Relation::left_join("author"))
                .relation(Relation::inner_join("tags").alias("author")),
        )
        .unwrap();

        let aliases: Vec<_> = config.resolved_relations().iter().map(|r| r.alias).collect();
        assert_eq!(aliases, vec!["a_2", "author", "author_2"]);
    }

    #[test]
    fn invalid_relation_alias_is_a_config_error() {
        let err = validated(PaginateConfig::new().relation(Relation::left_join("author").alias("x y")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRelation(_)));
    }

    #[test]
    fn selection_accepts_one_or_many() {
        assert_eq!(Selection::from("id").fields(), vec!["id"]);
        let many: Selection = serde_json::from_value(serde_json::json!(["id", "title"])).unwrap();
        assert!(many.contains("title"));
    }
}

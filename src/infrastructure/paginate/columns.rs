//! API property name → SQL column mapping
//!
//! Only mapped properties ever reach the query builder, so a sortable
//! property that is not in the map can never be interpolated into SQL.

use std::collections::HashMap;

use sea_orm::sea_query::{Alias, IntoColumnRef, SimpleExpr};
use sea_orm::{EntityTrait, IdenStatic, Iterable};

/// Relation property → effective join alias
pub type RelationAliases = HashMap<String, String>;

/// Where a property lives
#[derive(Debug, Clone)]
pub enum ColumnTarget<E: EntityTrait> {
    /// Column of the root entity
    Root(E::Column),
    /// Column of a joined relation, named by relation property. The table
    /// alias is looked up when the query is built.
    Joined { relation: String, column: String },
}

impl<E: EntityTrait> ColumnTarget<E> {
    /// Relation property a joined column depends on
    pub fn relation(&self) -> Option<&str> {
        match self {
            ColumnTarget::Root(_) => None,
            ColumnTarget::Joined { relation, .. } => Some(relation),
        }
    }

    /// Fully qualified column reference, or `None` when the relation is not
    /// joined.
    pub fn expr(&self, aliases: &RelationAliases) -> Option<SimpleExpr> {
        match self {
            ColumnTarget::Root(col) => Some(SimpleExpr::Column((E::default(), *col).into_column_ref())),
            ColumnTarget::Joined { relation, column } => aliases.get(relation).map(|alias| {
                SimpleExpr::Column((Alias::new(alias.as_str()), Alias::new(column.as_str())).into_column_ref())
            }),
        }
    }

    /// Name the column is projected under when selected explicitly
    pub fn select_alias(&self, aliases: &RelationAliases) -> Option<String> {
        match self {
            ColumnTarget::Root(col) => Some(col.as_str().to_string()),
            ColumnTarget::Joined { relation, column } => {
                aliases.get(relation).map(|alias| format!("{}_{}", alias, column))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnMap<E: EntityTrait> {
    map: HashMap<String, ColumnTarget<E>>,
}

impl<E: EntityTrait> Default for ColumnMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> ColumnMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Maps every root column under both its snake_case and camelCase name.
    pub fn with_all_columns() -> Self {
        E::Column::iter().fold(Self::new(), |map, col| {
            let snake = col.as_str().to_string();
            let camel = snake_to_camel(&snake);
            map.root(camel, col).root(snake, col)
        })
    }

    pub fn root(mut self, name: impl Into<String>, col: E::Column) -> Self {
        self.map
            .insert(name.into().to_lowercase(), ColumnTarget::Root(col));
        self
    }

    /// Maps `name` to `column` of the relation configured under `relation`.
    pub fn joined(
        mut self,
        name: impl Into<String>,
        relation: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.map.insert(
            name.into().to_lowercase(),
            ColumnTarget::Joined {
                relation: relation.into(),
                column: column.into(),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnTarget<E>> {
        self.map.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn snake_to_camel(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::entities::article;
    use sea_orm::sea_query::{Query, SqliteQueryBuilder};

    fn render(expr: SimpleExpr) -> String {
        Query::select()
            .expr(expr)
            .from(article::Entity)
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn all_columns_are_mapped_in_both_cases() {
        let map = ColumnMap::<article::Entity>::with_all_columns();
        assert!(map.contains("created_at"));
        assert!(map.contains("createdAt"));
        assert!(map.contains("CREATEDAT"));
        assert!(!map.contains("author.name"));
    }

    #[test]
    fn targets_render_qualified_columns() {
        let map = ColumnMap::<article::Entity>::new()
            .root("views", article::Column::Views)
            .joined("author.name", "author", "name");
        let aliases = RelationAliases::from([("author".to_string(), "writer".to_string())]);

        assert_eq!(
            render(map.get("views").unwrap().expr(&aliases).unwrap()),
            r#"SELECT "articles"."views" FROM "articles""#
        );
        assert_eq!(
            render(map.get("author.name").unwrap().expr(&aliases).unwrap()),
            r#"SELECT "writer"."name" FROM "articles""#
        );
        assert_eq!(
            map.get("author.name").unwrap().select_alias(&aliases).as_deref(),
            Some("writer_name")
        );
    }

    #[test]
    fn joined_column_without_its_relation_has_no_expression() {
        let map = ColumnMap::<article::Entity>::new().joined("author.name", "author", "name");
        let target = map.get("author.name").unwrap();

        assert_eq!(target.relation(), Some("author"));
        assert!(target.expr(&RelationAliases::new()).is_none());
        assert!(target.select_alias(&RelationAliases::new()).is_none());
    }

    #[test]
    fn snake_case_converts_to_camel_case() {
        assert_eq!(snake_to_camel("created_at"), "createdAt");
        assert_eq!(snake_to_camel("id"), "id");
    }
}

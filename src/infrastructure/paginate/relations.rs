//! Relation property → SeaORM join path

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::sea_query::{Alias, IntoIden, TableRef};
use sea_orm::{Condition, EntityTrait, IdenStatic, Iterable, JoinType, RelationDef};

use crate::pagination::RelationType;

/// Builds a fresh `RelationDef` for every join.
pub type RelationFn = Arc<dyn Fn() -> RelationDef + Send + Sync>;

/// The join path behind one relation property
#[derive(Clone)]
pub enum RelationSpec {
    /// belongs-to / has-one / has-many
    Direct(RelationFn),
    /// many-to-many through an association table
    Pivot {
        pivot: RelationFn,
        target: RelationFn,
    },
}

#[derive(Clone)]
pub struct RelationEntry {
    pub spec: RelationSpec,
    /// Target columns projected by `andSelect`
    pub columns: Vec<String>,
    /// Association table columns, projected by `andSelect` on a pivot join
    pub pivot_columns: Vec<String>,
}

/// A single `JOIN` ready to be applied
pub struct JoinStep {
    pub join_type: JoinType,
    pub def: RelationDef,
    pub alias: String,
}

impl RelationEntry {
    /// Columns of the table that ends up under the relation alias.
    pub fn selected_columns(&self, relation_type: RelationType) -> &[String] {
        match (&self.spec, relation_type) {
            (RelationSpec::Pivot { .. }, RelationType::PivotJoin) => &self.pivot_columns,
            _ => &self.columns,
        }
    }

    /// Expands the entry into joins for the given relation type.
    ///
    /// The last step is aliased `alias`; the pivot step of a many-to-many is
    /// aliased `{alias}_pivot`, or `alias` itself for a pivot join, which
    /// stops at the association table. `owner` re-roots the first join on a
    /// previously joined alias.
    pub fn join_steps(
        &self,
        relation_type: RelationType,
        alias: &str,
        owner: Option<&str>,
        cond: Option<Condition>,
    ) -> Vec<JoinStep> {
        let join_type = match relation_type {
            RelationType::InnerJoin => JoinType::InnerJoin,
            RelationType::LeftJoin | RelationType::PivotJoin => JoinType::LeftJoin,
        };

        let mut steps = match (&self.spec, relation_type) {
            (RelationSpec::Direct(def), _) => vec![JoinStep {
                join_type,
                def: def(),
                alias: alias.to_string(),
            }],
            (RelationSpec::Pivot { pivot, .. }, RelationType::PivotJoin) => vec![JoinStep {
                join_type,
                def: pivot(),
                alias: alias.to_string(),
            }],
            (RelationSpec::Pivot { pivot, target }, _) => {
                let pivot_alias = format!("{}_pivot", alias);
                let mut target = target();
                target.from_tbl = table_alias(&pivot_alias);
                vec![
                    JoinStep {
                        join_type,
                        def: pivot(),
                        alias: pivot_alias,
                    },
                    JoinStep {
                        join_type,
                        def: target,
                        alias: alias.to_string(),
                    },
                ]
            }
        };

        if let (Some(owner), Some(first)) = (owner, steps.first_mut()) {
            first.def.from_tbl = table_alias(owner);
        }

        if let Some(cond) = cond {
            if let Some(last) = steps.pop() {
                steps.push(JoinStep {
                    def: last.def.on_condition(move |_, _| cond.clone()),
                    ..last
                });
            }
        }

        steps
    }
}

fn table_alias(alias: &str) -> TableRef {
    TableRef::Table(Alias::new(alias).into_iden())
}

/// Relations that may be named in a `PaginateConfig`, keyed by property.
pub struct RelationRegistry<E: EntityTrait> {
    map: HashMap<String, RelationEntry>,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Default for RelationRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> RelationRegistry<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            _entity: PhantomData,
        }
    }

    /// Registers a direct relation to entity `R`.
    ///
    /// `def` is called once per join, e.g. `|| article::Relation::Author.def()`.
    pub fn direct<R: EntityTrait>(
        mut self,
        property: impl Into<String>,
        def: impl Fn() -> RelationDef + Send + Sync + 'static,
    ) -> Self {
        self.map.insert(
            property.into(),
            RelationEntry {
                spec: RelationSpec::Direct(Arc::new(def)),
                columns: column_names::<R>(),
                pivot_columns: Vec::new(),
            },
        );
        self
    }

    /// Registers a many-to-many relation to entity `R` through pivot entity `P`.
    pub fn pivot<P: EntityTrait, R: EntityTrait>(
        mut self,
        property: impl Into<String>,
        pivot: impl Fn() -> RelationDef + Send + Sync + 'static,
        target: impl Fn() -> RelationDef + Send + Sync + 'static,
    ) -> Self {
        self.map.insert(
            property.into(),
            RelationEntry {
                spec: RelationSpec::Pivot {
                    pivot: Arc::new(pivot),
                    target: Arc::new(target),
                },
                columns: column_names::<R>(),
                pivot_columns: column_names::<P>(),
            },
        );
        self
    }

    pub fn get(&self, property: &str) -> Option<&RelationEntry> {
        self.map.get(property)
    }
}

fn column_names<R: EntityTrait>() -> Vec<String> {
    R::Column::iter().map(|c| c.as_str().to_string()).collect()
}

//! SeaORM bridge for the pagination core

pub mod columns;
pub mod relations;
pub mod select;

pub use columns::{ColumnMap, ColumnTarget, RelationAliases};
pub use relations::{JoinStep, RelationEntry, RelationFn, RelationRegistry, RelationSpec};
pub use select::SeaPaginator;

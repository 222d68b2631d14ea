//! Pagination contract
//!
//! - [`PaginateDataQuery`]: untrusted request input
//! - [`PaginateConfig`] / [`PaginateOptions`]: caller policy, validated once
//! - [`Paginator`]: turns the former into a [`PaginateQuery`] and [`Links`]
//! - [`Paginated`]: the response envelope

pub mod config;
pub mod links;
pub mod normalizer;
pub mod options;
pub mod paginated;
pub mod query;
pub mod sort;

pub use config::{PaginateConfig, Relation, RelationType, ResolvedRelation, Selection};
pub use links::Links;
pub use normalizer::Paginator;
pub use options::PaginateOptions;
pub use paginated::Paginated;
pub use query::{ExtendedPaginateQuery, PaginateDataQuery, PaginateQuery};
pub use sort::{RequestedSort, Sort, SortDirection};

//! # sea-paginate
//!
//! Offset pagination for SeaORM queries, with HATEOAS links.
//!
//! ## Architecture
//!
//! - **pagination**: ORM-free core. Normalizes untrusted page/size/sort input
//!   against a per-resource [`PaginateConfig`] and builds navigation [`Links`]
//! - **infrastructure**: SeaORM bridge ([`SeaPaginator`]), database setup,
//!   migrations and demo data
//! - **interfaces**: Axum REST API with Swagger documentation
//! - **server**: demo server lifecycle
//! - **shared**: error types and graceful shutdown

pub mod config;
pub mod infrastructure;
pub mod interfaces;
pub mod pagination;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use pagination::{
    Links, PaginateConfig, PaginateDataQuery, PaginateOptions, PaginateQuery, Paginated, Paginator,
    Relation, RelationType, Sort, SortDirection,
};

pub use infrastructure::{init_database, ColumnMap, DatabaseConfig, RelationRegistry, SeaPaginator};

pub use interfaces::http::create_api_router;

pub use shared::{AppError, AppResult, ConfigError, InfraError};

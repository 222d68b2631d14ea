//! Infrastructure layer - external concerns

pub mod database;
pub mod paginate;

pub use database::{init_database, seed_demo_data, DatabaseConfig, Migrator};
pub use paginate::{ColumnMap, RelationRegistry, SeaPaginator};

pub mod entities;
pub mod migrator;
pub mod seed;

pub use migrator::Migrator;
pub use seed::seed_demo_data;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./paginate.db?mode=rwc")
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./paginate.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// In-memory SQLite URLs get a single connection, since every new
    /// connection would see an empty database.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let max_connections = if url.contains(":memory:") { 1 } else { 10 };
        Self {
            url,
            max_connections,
        }
    }

    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self::new(format!("sqlite://{}?mode=rwc", path))
    }

    /// Private in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}


#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait};

    use super::entities::{article, article_tag};
    use super::seed::{seed_demo_data, DEMO_ARTICLES};
    use super::testing::seeded_db;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = seeded_db().await;
        assert!(!seed_demo_data(&db).await.unwrap());
        assert_eq!(
            article::Entity::find().count(&db).await.unwrap(),
            DEMO_ARTICLES as u64
        );
        assert_eq!(
            article_tag::Entity::find().count(&db).await.unwrap(),
            DEMO_ARTICLES as u64
        );
    }
}

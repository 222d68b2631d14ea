use thiserror::Error;

/// Setup-time mistakes in a pagination config or options.
///
/// Raised once when a [`Paginator`](crate::pagination::Paginator) is built,
/// never per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid pagination options: {0}")]
    InvalidOptions(#[from] validator::ValidationErrors),

    #[error("Invalid root alias: {0:?}")]
    InvalidAlias(String),

    #[error("Invalid sortable property: {0:?}")]
    InvalidSortable(String),

    #[error("Sortable property listed twice: {0}")]
    DuplicateSortable(String),

    #[error("Invalid select entry: {0:?}")]
    InvalidSelect(String),

    #[error("Sortable property {0} is not part of the configured select")]
    SelectConflict(String),

    #[error("Default sort property {0} is not sortable")]
    DefaultSortNotSortable(String),

    #[error("Invalid relation: {0}")]
    InvalidRelation(String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::Infra(InfraError::Database(e))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Infra(InfraError::Io(e))
    }
}

pub type AppResult<T> = Result<T, AppError>;

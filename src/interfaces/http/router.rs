//! API Router with Swagger UI

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::articles::{self, ArticleDto, ArticlesState};
use super::modules::health::{self, ComponentHealth, HealthResponse, HealthState};
use crate::pagination::{Links, PaginateOptions, PaginateQuery, Paginated, Sort, SortDirection};
use crate::shared::ConfigError;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::handlers::health_check,
        articles::handlers::list_articles,
    ),
    components(
        schemas(
            ApiResponse<String>,
            Paginated<ArticleDto>,
            ArticleDto,
            PaginateQuery,
            Links,
            Sort,
            SortDirection,
            HealthResponse,
            ComponentHealth,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Articles", description = "Paginated, sortable article listing"),
    ),
    info(
        title = "sea-paginate demo API",
        version = "1.0.0",
        description = "Offset pagination with HATEOAS links over SeaORM",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// Fails if the pagination options or a resource's pagination config are
/// invalid.
pub fn create_api_router(
    db: DatabaseConnection,
    options: PaginateOptions,
) -> Result<Router, ConfigError> {
    let article_routes = Router::new()
        .route("/", get(articles::list_articles))
        .with_state(ArticlesState::new(db.clone(), options)?);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState::new(db));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes =
        SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi());

    Ok(Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1/articles", article_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

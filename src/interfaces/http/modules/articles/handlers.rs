//! Article listing handler

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, RelationTrait, Select,
};
use tracing::error;

use super::dto::ArticleDto;
use crate::infrastructure::database::entities::{article, author};
use crate::infrastructure::paginate::{ColumnMap, RelationRegistry, SeaPaginator};
use crate::interfaces::http::common::{ApiResponse, PaginationParams, PaginationQuery};
use crate::pagination::{PaginateConfig, PaginateDataQuery, PaginateOptions, Paginated, Relation, Sort};
use crate::shared::ConfigError;

/// Articles handler state
#[derive(Clone)]
pub struct ArticlesState {
    pub db: DatabaseConnection,
    pub paginator: Arc<SeaPaginator<article::Entity>>,
}

impl ArticlesState {
    pub fn new(db: DatabaseConnection, options: PaginateOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            db,
            paginator: Arc::new(article_paginator(options)?),
        })
    }
}

/// Pagination policy for `GET /api/v1/articles`: published articles only,
/// joined with their author under the `writer` alias.
pub fn article_paginator(options: PaginateOptions) -> Result<SeaPaginator<article::Entity>, ConfigError> {
    let config = PaginateConfig::new()
        .sortable(["id", "title", "views", "rating", "createdAt", "author.name"])
        .default_sort(Sort::asc("id"))
        .where_clause(Condition::all().add(article::Column::Published.eq(true)))
        .relation(Relation::left_join("author").alias("writer").and_select());

    let columns = ColumnMap::with_all_columns().joined("author.name", "author", "name");
    let relations = RelationRegistry::new()
        .direct::<author::Entity>("author", || article::Relation::Author.def());

    SeaPaginator::new(config, options, columns, relations)
}

/// Applies the `authorId` filter; other filter keys are ignored.
fn apply_filters(select: Select<article::Entity>, query: &PaginateDataQuery) -> Select<article::Entity> {
    let author_ids: Vec<i32> = query
        .filters
        .get("authorId")
        .into_iter()
        .flatten()
        .filter_map(|v| v.parse().ok())
        .collect();

    if author_ids.is_empty() {
        select
    } else {
        select.filter(article::Column::AuthorId.is_in(author_ids))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/articles",
    tag = "Articles",
    params(
        PaginationParams,
        ("authorId" = Option<Vec<i32>>, Query, description = "Only articles by these authors")
    ),
    responses(
        (status = 200, description = "One page of published articles", body = Paginated<ArticleDto>),
        (status = 400, description = "Undecodable query string", body = ApiResponse<String>),
        (status = 500, description = "Database error", body = ApiResponse<String>)
    )
)]
pub async fn list_articles(
    State(state): State<ArticlesState>,
    PaginationQuery(query): PaginationQuery,
) -> Result<Json<Paginated<ArticleDto>>, (StatusCode, Json<ApiResponse<()>>)> {
    let select = apply_filters(article::Entity::find(), &query);

    let page = state
        .paginator
        .fetch::<ArticleDto, _>(select, &query, &state.db)
        .await
        .map_err(|e| {
            error!("Failed to list articles: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string())))
        })?;

    Ok(Json(page))
}
